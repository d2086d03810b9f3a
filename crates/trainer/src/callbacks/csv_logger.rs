//! Per-epoch CSV metrics log.

use csv::WriterBuilder;
use std::fs::{File, OpenOptions};
use std::path::PathBuf;

use super::Callback;
use crate::error::Result;
use crate::history::Logs;
use crate::model::ModelState;

/// Writes one row per completed epoch: the epoch index followed by every log
/// value, under a header of `epoch` and the sorted log keys seen at the first
/// epoch. Keys missing from a later epoch are written as `NA`.
pub struct CsvLogger {
    path: PathBuf,
    separator: u8,
    append: bool,
    keys: Option<Vec<String>>,
    writer: Option<csv::Writer<File>>,
    write_header: bool,
}

impl CsvLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            separator: b',',
            append: false,
            keys: None,
            writer: None,
            write_header: true,
        }
    }

    pub fn separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    /// Keep existing rows instead of truncating the file.
    pub fn append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }
}

impl Callback for CsvLogger {
    fn on_train_begin(&mut self, _model: &mut dyn ModelState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        self.write_header = !(self.append
            && std::fs::metadata(&self.path).map(|m| m.len() > 0).unwrap_or(false));
        self.keys = None;

        let file = if self.append {
            OpenOptions::new().create(true).append(true).open(&self.path)?
        } else {
            File::create(&self.path)?
        };
        self.writer = Some(
            WriterBuilder::new()
                .delimiter(self.separator)
                .has_headers(false)
                .from_writer(file),
        );
        Ok(())
    }

    fn on_epoch_end(&mut self, _model: &mut dyn ModelState, epoch: usize, logs: &Logs) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };

        let keys = self
            .keys
            .get_or_insert_with(|| logs.keys().cloned().collect());

        if self.write_header {
            let mut header = vec!["epoch".to_string()];
            header.extend(keys.iter().cloned());
            writer.write_record(&header)?;
            self.write_header = false;
        }

        let mut row = vec![epoch.to_string()];
        row.extend(keys.iter().map(|k| match logs.get(k) {
            Some(v) => v.to_string(),
            None => "NA".to_string(),
        }));
        writer.write_record(&row)?;
        writer.flush()?;
        Ok(())
    }

    fn on_train_end(&mut self, _model: &mut dyn ModelState) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}
