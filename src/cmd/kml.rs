use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;

use crate::bytes::be_i32;
use crate::cmd;
use crate::fmt::float8;
use crate::scan::{scan, Handler};
use crate::schema::Kind;

const PROLOG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://earth.google.com/kml/2.2">
<Placemark>
    <name>Path255</name>
    <Style>
        <LineStyle>
            <color>ff0000ff</color>
            <width>3.1</width>
        </LineStyle>
    </Style>
    <LineString>
        <tessellate>1</tessellate>
        <coordinates>
"#;

const EPILOG: &str = r#"        </coordinates>
    </LineString>
</Placemark>
</kml>
"#;

/// Writes one KML `<LineString>` with a coordinate triplet per GPS position
/// message; everything else is ignored.
struct KmlWriter<W: Write> {
    out: W,
}

impl<W: Write> KmlWriter<W> {
    fn new(mut out: W) -> Result<KmlWriter<W>> {
        out.write_all(PROLOG.as_bytes())?;
        Ok(KmlWriter { out })
    }
}

impl<W: Write> Handler for KmlWriter<W> {
    fn handle(&mut self, kind: Kind, frame: &[u8]) -> Result<()> {
        if kind != Kind::GpsPosition {
            return Ok(());
        }
        let longitude = f64::from(be_i32(&frame[1..])) * 1e-7;
        let latitude = f64::from(be_i32(&frame[5..])) * 1e-7;
        writeln!(
            self.out,
            "        {},{},0.0",
            float8(longitude),
            float8(latitude)
        )?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.write_all(EPILOG.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

pub fn run(inputs: &[PathBuf]) -> Result<()> {
    cmd::for_each_input(inputs, |path| {
        let buffer = cmd::load_file(path)?;
        let stdout = std::io::stdout();
        let mut writer = KmlWriter::new(stdout.lock())?;
        scan(&mut writer, &buffer)?;
        writer.flush()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum;

    #[test]
    fn emits_one_triplet_per_position() {
        let mut frame = vec![10u8; 14];
        // longitude 52.1234567 deg, latitude 4.1234567 deg
        frame[1..5].copy_from_slice(&521234567i32.to_be_bytes());
        frame[5..9].copy_from_slice(&41234567i32.to_be_bytes());
        frame[9..13].copy_from_slice(&1500u32.to_be_bytes());
        checksum::seal(&mut frame);

        let mut out = Vec::new();
        {
            let mut writer = KmlWriter::new(&mut out).unwrap();
            writer.handle(Kind::GpsPosition, &frame).unwrap();
            writer.flush().unwrap();
        }
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("<?xml"));
        assert!(text.contains("        52.123457,4.1234567,0.0\n"));
        assert!(text.ends_with("</kml>\n"));
    }
}
