//! Where the file path, index name and host come from.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ImportError, Result};

/// Source of the three values a run needs. Any method may cancel the run.
pub trait InputProvider {
    fn file_path(&mut self) -> Result<PathBuf>;
    fn index_name(&mut self, default: &str) -> Result<String>;
    fn host(&mut self, default: &str) -> Result<String>;
}

/// `index_` + lower-cased file name without its last extension.
pub fn default_index_name(prefix: &str, csv_path: &Path) -> String {
    let stem = csv_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    format!("{}{}", prefix, stem)
}

fn ensure_readable(path: PathBuf) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(ImportError::Cancelled(format!("{:?} is not a readable file", path)))
    }
}

/// Values given on the command line. Omitted index/host fall back to defaults.
#[derive(Debug, Default, Clone)]
pub struct ArgsInput {
    file: Option<PathBuf>,
    index: Option<String>,
    host: Option<String>,
}

impl ArgsInput {
    pub fn new(file: Option<PathBuf>, index: Option<String>, host: Option<String>) -> Self {
        Self { file, index, host }
    }
}

impl InputProvider for ArgsInput {
    fn file_path(&mut self) -> Result<PathBuf> {
        match self.file.take() {
            Some(path) => ensure_readable(path),
            None => Err(ImportError::Cancelled("no CSV file given".to_string())),
        }
    }

    fn index_name(&mut self, default: &str) -> Result<String> {
        Ok(self.index.take().unwrap_or_else(|| default.to_string()))
    }

    fn host(&mut self, default: &str) -> Result<String> {
        Ok(self.host.take().unwrap_or_else(|| default.to_string()))
    }
}

/// Line-based prompts. Enter keeps the default, end of input cancels.
pub struct PromptInput<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> PromptInput<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    fn ask(&mut self, title: &str, default: Option<&str>) -> Result<String> {
        match default {
            Some(value) => write!(self.writer, "{} [{}]: ", title, value)?,
            None => write!(self.writer, "{}: ", title)?,
        }
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(ImportError::Cancelled(format!("{} prompt closed", title)));
        }
        let answer = line.trim();
        debug!("Prompt {:?} answered {:?}", title, answer);

        match (answer.is_empty(), default) {
            (false, _) => Ok(answer.to_string()),
            (true, Some(value)) => Ok(value.to_string()),
            (true, None) => Err(ImportError::Cancelled(format!("{} left empty", title))),
        }
    }
}

impl<R: BufRead, W: Write> InputProvider for PromptInput<R, W> {
    fn file_path(&mut self) -> Result<PathBuf> {
        let answer = self.ask("CSV file", None)?;
        ensure_readable(PathBuf::from(answer))
    }

    fn index_name(&mut self, default: &str) -> Result<String> {
        self.ask("Index name", Some(default))
    }

    fn host(&mut self, default: &str) -> Result<String> {
        self.ask("Host", Some(default))
    }
}

/// Flags first; whatever is missing is asked for.
pub struct MixedInput<R, W> {
    args: ArgsInput,
    prompt: PromptInput<R, W>,
}

impl<R: BufRead, W: Write> MixedInput<R, W> {
    pub fn new(args: ArgsInput, prompt: PromptInput<R, W>) -> Self {
        Self { args, prompt }
    }
}

impl<R: BufRead, W: Write> InputProvider for MixedInput<R, W> {
    fn file_path(&mut self) -> Result<PathBuf> {
        if self.args.file.is_some() {
            self.args.file_path()
        } else {
            self.prompt.file_path()
        }
    }

    fn index_name(&mut self, default: &str) -> Result<String> {
        match self.args.index.take() {
            Some(index) => Ok(index),
            None => self.prompt.index_name(default),
        }
    }

    fn host(&mut self, default: &str) -> Result<String> {
        match self.args.host.take() {
            Some(host) => Ok(host),
            None => self.prompt.host(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompt(input: &str) -> PromptInput<Cursor<Vec<u8>>, Vec<u8>> {
        PromptInput::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn default_index_from_file_stem() {
        assert_eq!(
            default_index_name("index_", Path::new("Sales2024.csv")),
            "index_sales2024"
        );
        assert_eq!(
            default_index_name("index_", Path::new("/data/in/Q1.Report.CSV")),
            "index_q1.report"
        );
        assert_eq!(default_index_name("idx-", Path::new("plain")), "idx-plain");
    }

    #[test]
    fn args_fall_back_to_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut input = ArgsInput::new(Some(file.path().to_path_buf()), None, None);

        assert_eq!(input.file_path().unwrap(), file.path());
        assert_eq!(input.index_name("index_x").unwrap(), "index_x");
        assert_eq!(input.host("127.0.0.1:9200").unwrap(), "127.0.0.1:9200");
    }

    #[test]
    fn args_without_file_cancel() {
        let mut input = ArgsInput::default();
        assert!(matches!(input.file_path(), Err(ImportError::Cancelled(_))));

        let mut input = ArgsInput::new(Some(PathBuf::from("/no/such/file.csv")), None, None);
        assert!(matches!(input.file_path(), Err(ImportError::Cancelled(_))));
    }

    #[test]
    fn prompt_enter_keeps_default() {
        let mut input = prompt("\n  \n");
        assert_eq!(input.index_name("index_sales").unwrap(), "index_sales");
        assert_eq!(input.host("127.0.0.1:9200").unwrap(), "127.0.0.1:9200");
        assert_eq!(
            String::from_utf8(input.writer.clone()).unwrap(),
            "Index name [index_sales]: Host [127.0.0.1:9200]: "
        );
    }

    #[test]
    fn prompt_answer_overrides_default() {
        let mut input = prompt("custom\nes:9201\n");
        assert_eq!(input.index_name("index_sales").unwrap(), "custom");
        assert_eq!(input.host("127.0.0.1:9200").unwrap(), "es:9201");
    }

    #[test]
    fn prompt_eof_cancels() {
        let mut input = prompt("");
        assert!(matches!(
            input.index_name("index_sales"),
            Err(ImportError::Cancelled(_))
        ));
    }

    struct FailingReader;

    impl std::io::Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "tty gone"))
        }
    }

    #[test]
    fn prompt_read_failure_is_io_error() {
        let mut input = PromptInput::new(std::io::BufReader::new(FailingReader), Vec::new());
        assert!(matches!(input.host("127.0.0.1:9200"), Err(ImportError::Io(_))));
    }

    #[test]
    fn prompt_empty_file_path_cancels() {
        let mut input = prompt("\n");
        assert!(matches!(input.file_path(), Err(ImportError::Cancelled(_))));
    }

    #[test]
    fn mixed_only_prompts_for_missing_values() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let args = ArgsInput::new(Some(file.path().to_path_buf()), None, Some("es:9200".into()));
        let mut input = MixedInput::new(args, prompt("my_index\n"));

        assert_eq!(input.file_path().unwrap(), file.path());
        assert_eq!(input.index_name("index_tmp").unwrap(), "my_index");
        assert_eq!(input.host("127.0.0.1:9200").unwrap(), "es:9200");
    }
}
