//! The message catalogue of the data-logger.
//!
//! Every known message kind is described by a static [`Entry`]: its header
//! byte (or a run of consecutive header bytes sharing one layout), its framed
//! size and, for the messages whose payload the tools decode or encode, the
//! field layout. The [`Schema`] expands the catalogue into a 256-slot
//! dispatch table once at startup; lookups during scanning are a single
//! index.

use std::sync::OnceLock;

mod catalog;

pub use self::catalog::CATALOG;

/// `(header, sub_index)` identifies one data channel. The sub index is
/// zero for single-valued messages and the first payload byte for the
/// multiplexed external channels.
pub type ChannelKey = (u8, u8);

/// One tag per message kind in the catalogue, plus the synthesised
/// parse-error event emitted by the scanner for unrecognised bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    RunInformation,
    RunStartStop,
    RawGps,
    NewSectorTime,
    NewLapMarker,
    LoggerStorage,
    GpsTimeStorage,
    Accelerations,
    Timestamp,
    GpsPosition,
    GpsRawSpeed,
    BeaconPulsePresent,
    Frequency,
    SerialDataInput,
    Analogue,
    ChannelData,
    DisplayData,
    Reflash,
    DateStorage,
    GpsCourse,
    GpsAccuracy,
    ExtendedFrequency,
    ExtendedRpm,
    StartOfRun,
    ProcessedSpeed,
    GearSetup,
    BargraphSetup,
    DashboardSetup,
    DashboardSetup2,
    NewTargetSectorTime,
    NewTargetMarkerTime,
    AuxiliaryInput,
    ExternalTemperature,
    ExternalFrequency,
    ExternalAuxiliary,
    ExternalTime,
    NewLcdData,
    NewLedData,
    PrecalcDistanceData,
    YawRates,
    CalculatedYaw,
    PitchRate,
    PitchAngle,
    RollRate,
    RollAngle,
    Gradient,
    PulseCount,
    Baseline,
    UnitControl,
    ZAcceleration,
    ExternalAngle,
    ExternalPressure,
    ExternalMisc,
    TimeIntoCurrentLap,
    HighResTimer,
    CanData,
    UserDefined,
    SectorDefinition,
    BrakeboxToPc,
    DvrCommunication,
    VideoFrameIndex,
    LocalNedVelocities,
    GeneralConfiguration,
    ParseError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Size {
    /// Full frame length, header and checksum included.
    Fixed(u8),
    /// Length comes from the byte after the header: total = `byte[1] + 3`.
    Variable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Big,
    Little,
}

/// A payload field of a message whose layout the schema knows in full.
///
/// Fixed-point values are integers divided by a denominator; a denominator
/// of 1 is a plain integer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field {
    ChannelId,
    Ignore(u8),
    Float32,
    Int {
        bytes: u8,
        order: ByteOrder,
        signed: bool,
        denominator: u32,
    },
}

impl Field {
    #[allow(dead_code)]
    pub fn size(&self) -> usize {
        match self {
            Field::ChannelId => 1,
            Field::Ignore(n) => *n as usize,
            Field::Float32 => 4,
            Field::Int { bytes, .. } => *bytes as usize,
        }
    }
}

/// One catalogue record. `span` is the number of consecutive headers that
/// share this layout; singletons have span 1.
#[derive(Debug)]
pub struct Entry {
    pub kind: Kind,
    pub header: u8,
    pub span: u8,
    pub size: Size,
    pub description: &'static str,
    pub fields: &'static [Field],
}

impl Entry {
    pub fn last_header(&self) -> u8 {
        self.header + (self.span - 1)
    }
}

pub struct Schema {
    table: [Option<&'static Entry>; 256],
}

impl Schema {
    fn new() -> Schema {
        let mut table: [Option<&'static Entry>; 256] = [None; 256];
        for entry in CATALOG {
            for header in entry.header..=entry.last_header() {
                assert!(
                    table[header as usize].is_none(),
                    "schema catalogue claims header {} twice",
                    header
                );
                table[header as usize] = Some(entry);
            }
        }
        Schema { table }
    }

    pub fn lookup(&self, header: u8) -> Option<&'static Entry> {
        self.table[header as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static Entry> {
        CATALOG.iter()
    }

    /// Human-readable name for a header byte. Members of a header range get
    /// their offset appended, e.g. `"Analogue (3)"`.
    pub fn name(&self, header: u8) -> Option<String> {
        self.lookup(header).map(|entry| {
            if entry.span == 1 {
                entry.description.to_string()
            } else {
                format!("{} ({})", entry.description, header - entry.header)
            }
        })
    }
}

static SCHEMA: OnceLock<Schema> = OnceLock::new();

pub fn schema() -> &'static Schema {
    SCHEMA.get_or_init(Schema::new)
}
