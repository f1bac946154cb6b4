//! The static message catalogue.
//!
//! Sizes include the header and checksum bytes. Field layouts are given only
//! for the messages the tools decode into cooked values or rebuild from CSV
//! cells.

use super::{ByteOrder, Entry, Field, Kind, Size};

const TIMESTAMP_FIELDS: &[Field] = &[Field::Int {
    bytes: 3,
    order: ByteOrder::Big,
    signed: false,
    denominator: 100,
}];

const ANALOGUE_FIELDS: &[Field] = &[Field::Int {
    bytes: 2,
    order: ByteOrder::Big,
    signed: false,
    denominator: 1000,
}];

const EXTERNAL_TEMPERATURE_FIELDS: &[Field] = &[
    Field::ChannelId,
    Field::Int {
        bytes: 2,
        order: ByteOrder::Little,
        signed: true,
        denominator: 10,
    },
];

const EXTERNAL_AUXILIARY_FIELDS: &[Field] = &[
    Field::ChannelId,
    Field::Int {
        bytes: 2,
        order: ByteOrder::Little,
        signed: false,
        denominator: 10,
    },
];

const USER_DEFINED_FIELDS: &[Field] = &[Field::ChannelId, Field::Ignore(1), Field::Float32];

macro_rules! entry {
    ($kind:ident, $header:expr, $size:expr, $desc:expr) => {
        entry!($kind, $header, 1, $size, $desc, &[])
    };
    ($kind:ident, $header:expr, $span:expr, $size:expr, $desc:expr) => {
        entry!($kind, $header, $span, $size, $desc, &[])
    };
    ($kind:ident, $header:expr, $span:expr, $size:expr, $desc:expr, $fields:expr) => {
        Entry {
            kind: Kind::$kind,
            header: $header,
            span: $span,
            size: $size,
            description: $desc,
            fields: $fields,
        }
    };
}

use Size::{Fixed, Variable};

pub static CATALOG: &[Entry] = &[
    entry!(RunInformation, 1, Fixed(9), "Run Information"),
    entry!(RunStartStop, 2, Fixed(11), "Run start/stop info"),
    entry!(RawGps, 3, Variable, "Raw GPS Data Input"),
    entry!(NewSectorTime, 4, Fixed(7), "New Sector Time"),
    entry!(NewLapMarker, 5, Fixed(21), "New Lap Marker"),
    entry!(LoggerStorage, 6, Fixed(6), "Logger Storage"),
    entry!(GpsTimeStorage, 7, Fixed(6), "GPS Time Storage"),
    entry!(Accelerations, 8, Fixed(6), "Accelerations"),
    entry!(Timestamp, 9, 1, Fixed(5), "Time Stamp", TIMESTAMP_FIELDS),
    entry!(GpsPosition, 10, Fixed(14), "GPS Positional Data"),
    entry!(GpsRawSpeed, 11, Fixed(10), "GPS Raw Speed Data"),
    entry!(BeaconPulsePresent, 12, Fixed(3), "Beacon Pulse Present"),
    entry!(Frequency, 14, 5, Fixed(5), "Frequency"),
    entry!(SerialDataInput, 19, Variable, "Serial Data Input"),
    entry!(Analogue, 20, 32, Fixed(4), "Analogue", ANALOGUE_FIELDS),
    entry!(ChannelData, 52, Fixed(67), "Channel Data"),
    entry!(DisplayData, 53, Fixed(11), "Display Data"),
    entry!(Reflash, 54, Fixed(6), "Reflash"),
    entry!(DateStorage, 55, Fixed(10), "Date Storage"),
    entry!(GpsCourse, 56, Fixed(10), "GPS Course Data"),
    entry!(GpsAccuracy, 57, Fixed(10), "GPS Altitude and Speed Accuracy"),
    entry!(ExtendedFrequency, 58, 4, Fixed(11), "Extended Frequency"),
    entry!(ExtendedRpm, 62, Fixed(11), "Extended RPM"),
    entry!(StartOfRun, 63, Fixed(3), "Start of Run"),
    entry!(ProcessedSpeed, 64, Fixed(5), "Processed Speed Data"),
    entry!(GearSetup, 65, Fixed(30), "Gear Set Up Data"),
    entry!(BargraphSetup, 66, Fixed(11), "Bargraph Set Up Data"),
    entry!(DashboardSetup, 67, Fixed(4), "Dashboard Set Up Data"),
    entry!(DashboardSetup2, 68, Fixed(4), "Dashboard Set Up Data Two"),
    entry!(NewTargetSectorTime, 69, Fixed(42), "New Target Sector Time"),
    entry!(NewTargetMarkerTime, 70, Fixed(42), "New Target Marker Time"),
    entry!(AuxiliaryInput, 71, Fixed(3), "Auxiliary Input Module Number"),
    entry!(
        ExternalTemperature,
        72,
        1,
        Fixed(5),
        "External Temperature",
        EXTERNAL_TEMPERATURE_FIELDS
    ),
    entry!(ExternalFrequency, 73, Fixed(5), "External Frequency"),
    entry!(
        ExternalAuxiliary,
        74,
        1,
        Fixed(5),
        "External Auxiliary",
        EXTERNAL_AUXILIARY_FIELDS
    ),
    entry!(ExternalTime, 75, Fixed(6), "External Time"),
    entry!(NewLcdData, 76, Fixed(24), "New LCD Data"),
    entry!(NewLedData, 77, Fixed(3), "New LED Data"),
    entry!(PrecalcDistanceData, 78, Fixed(6), "Pre Calculated Distance Data"),
    entry!(YawRates, 79, Fixed(4), "Yaw Rates"),
    entry!(CalculatedYaw, 80, Fixed(5), "Calculated Yaw"),
    entry!(PitchRate, 81, Fixed(5), "Pitch Rate"),
    entry!(PitchAngle, 82, Fixed(5), "Pitch Angle"),
    entry!(RollRate, 83, Fixed(5), "Roll Rate"),
    entry!(RollAngle, 84, Fixed(5), "Roll Angle"),
    entry!(Gradient, 85, Fixed(10), "Gradient"),
    entry!(PulseCount, 86, 4, Fixed(5), "Pulse Count"),
    entry!(Baseline, 90, Fixed(6), "Baseline"),
    entry!(UnitControl, 91, Fixed(5), "Unit Control"),
    entry!(ZAcceleration, 92, Fixed(4), "Z Acceleration"),
    entry!(ExternalAngle, 93, Fixed(5), "External Angle"),
    entry!(ExternalPressure, 94, Fixed(6), "External Pressure"),
    entry!(ExternalMisc, 95, Fixed(5), "External Miscellaneous"),
    entry!(TimeIntoCurrentLap, 96, Fixed(10), "Time in to current lap and sector"),
    entry!(HighResTimer, 97, Fixed(8), "High resolution event timer"),
    entry!(CanData, 98, Variable, "CAN data"),
    entry!(UserDefined, 99, 1, Fixed(7), "User defined", USER_DEFINED_FIELDS),
    entry!(SectorDefinition, 101, Fixed(19), "Sector Definition"),
    entry!(BrakeboxToPc, 102, Variable, "BRAKEBOX to PC Communication"),
    entry!(DvrCommunication, 103, Fixed(17), "DVR Communication"),
    entry!(VideoFrameIndex, 104, Fixed(9), "Video frame index"),
    entry!(LocalNedVelocities, 105, Fixed(11), "Local NED velocities"),
    entry!(GeneralConfiguration, 107, Variable, "General Configuration Message"),
];
