//! Record log: the comma-separated stream of run header, column headers and
//! per-node data records.

use dsim_core::{Error, Result, WorldConfig};
use std::io::Write;

/// Column header emitted at creation and at the start of every tick
pub const NODE_HEADER: &str =
    "id,current pos x,y,start pos x,y,infectable,infected,infected for,max travel,maxSpeed";

/// Destination for log records. Each record is one line of fields.
pub trait LogSink {
    fn write_record(&mut self, fields: &[String]) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn write_record(&mut self, fields: &[String]) -> Result<()> {
        (**self).write_record(fields)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Discards every record
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn write_record(&mut self, _fields: &[String]) -> Result<()> {
        Ok(())
    }
}

/// Writes records as CSV lines to any `io::Write`
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W) -> Self {
        // Header lines and data lines have different widths
        let writer = csv::WriterBuilder::new()
            .flexible(true)
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(inner);
        Self { writer }
    }

    /// Flush buffered records and hand back the underlying writer
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))
    }
}

impl<W: Write> LogSink for CsvSink<W> {
    fn write_record(&mut self, fields: &[String]) -> Result<()> {
        self.writer.write_record(fields)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Run header: the seed followed by every configuration value, one per line
pub fn run_header(config: &WorldConfig) -> Vec<Vec<String>> {
    let pair = |name: &str, value: String| vec![name.to_string(), value];
    vec![
        pair("seed", config.seed.to_string()),
        pair("Node count", config.num_nodes.to_string()),
        pair("min infected time", config.min_inf_time.to_string()),
        pair("max infected time", config.max_inf_time.to_string()),
        pair("survival rate", config.survival_rate.to_string()),
        pair("reinfect", flag(config.reinfect)),
        pair("maxSpeed", config.max_speed.to_string()),
    ]
}

pub fn column_header() -> Vec<String> {
    NODE_HEADER.split(',').map(str::to_string).collect()
}

pub(crate) fn flag(value: bool) -> String {
    u8::from(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(records: &[Vec<String>]) -> String {
        let mut sink = CsvSink::new(Vec::new());
        for record in records {
            sink.write_record(record).unwrap();
        }
        String::from_utf8(sink.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_run_header_lines() {
        let config = WorldConfig {
            seed: 42,
            num_nodes: 10,
            reinfect: true,
            ..Default::default()
        };
        let text = render(&run_header(&config));
        assert_eq!(
            text,
            "seed,42\nNode count,10\nmin infected time,5\nmax infected time,20\n\
             survival rate,0.8\nreinfect,1\nmaxSpeed,1\n"
        );
    }

    #[test]
    fn test_column_header_is_unquoted() {
        let text = render(&[column_header()]);
        assert_eq!(text, format!("{}\n", NODE_HEADER));
        assert_eq!(column_header().len(), 10);
    }

    #[test]
    fn test_null_sink_accepts_everything() {
        let mut sink = NullSink;
        assert!(sink.write_record(&column_header()).is_ok());
        assert!(sink.flush().is_ok());
    }

    #[test]
    fn test_boxed_sink() {
        let mut sink: Box<dyn LogSink> = Box::new(NullSink);
        assert!(sink.write_record(&["a".to_string()]).is_ok());
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn test_write_failure_surfaces_as_io_error() {
        let mut sink = CsvSink::new(BrokenPipe);
        // Buffered write may succeed; the flush must not
        let _ = sink.write_record(&column_header());
        assert!(matches!(sink.flush(), Err(Error::Io(_))));
    }
}
