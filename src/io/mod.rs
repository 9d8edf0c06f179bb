//! Destinations for the diagnostic lines written by verbose factorizations
//! and GUB layers.
//!
//! Output goes to stdout unless redirected through
//! [`ConfigurablePrintTarget`].  Nothing is written at all while the
//! owning object's `verbose` setting is off.

use std::fs::File;
use std::io::{self, Write};

/// Where diagnostic output is written.
#[derive(Default)]
pub enum PrintTarget {
    #[default]
    Stdout,
    File(File),
    /// kept in memory until fetched with
    /// [`get_print_buffer`](ConfigurablePrintTarget::get_print_buffer)
    Buffer(Vec<u8>),
    Stream(Box<dyn Write + Send + Sync>),
    /// discard everything
    Sink,
}

impl std::fmt::Debug for PrintTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PrintTarget::Stdout => "Stdout",
            PrintTarget::File(_) => "File",
            PrintTarget::Buffer(buffer) => return write!(f, "Buffer({} bytes)", buffer.len()),
            PrintTarget::Stream(_) => "Stream",
            PrintTarget::Sink => "Sink",
        };
        f.write_str(name)
    }
}

impl Write for PrintTarget {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            PrintTarget::Stdout => io::stdout().lock().write(buf),
            PrintTarget::File(file) => file.write(buf),
            PrintTarget::Buffer(buffer) => buffer.write(buf),
            PrintTarget::Stream(stream) => stream.write(buf),
            PrintTarget::Sink => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            PrintTarget::Stdout => io::stdout().lock().flush(),
            PrintTarget::File(file) => file.flush(),
            PrintTarget::Stream(stream) => stream.flush(),
            PrintTarget::Buffer(_) | PrintTarget::Sink => Ok(()),
        }
    }
}

/// Redirection of diagnostic output.
///
/// Implementors only expose their [`PrintTarget`]; every redirection
/// is provided on top of it.
pub trait ConfigurablePrintTarget {
    fn print_target_mut(&mut self) -> &mut PrintTarget;

    fn print_to_stdout(&mut self) {
        *self.print_target_mut() = PrintTarget::Stdout;
    }

    fn print_to_file(&mut self, file: File) {
        *self.print_target_mut() = PrintTarget::File(file);
    }

    fn print_to_stream(&mut self, stream: Box<dyn Write + Send + Sync>) {
        *self.print_target_mut() = PrintTarget::Stream(stream);
    }

    /// Start collecting output in memory, dropping anything collected so far.
    fn print_to_buffer(&mut self) {
        *self.print_target_mut() = PrintTarget::Buffer(Vec::new());
    }

    fn print_to_sink(&mut self) {
        *self.print_target_mut() = PrintTarget::Sink;
    }

    /// Everything written since the last [`print_to_buffer`](Self::print_to_buffer).
    fn get_print_buffer(&mut self) -> io::Result<String> {
        match self.print_target_mut() {
            PrintTarget::Buffer(buffer) => Ok(String::from_utf8_lossy(buffer).into_owned()),
            other => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("output goes to {other:?}, not to a buffer"),
            )),
        }
    }

    fn print_target(&mut self) -> &dyn Write {
        self.print_target_mut()
    }
}

impl ConfigurablePrintTarget for PrintTarget {
    fn print_target_mut(&mut self) -> &mut PrintTarget {
        self
    }
}
