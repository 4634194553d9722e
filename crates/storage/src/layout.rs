//! Output path layout.
//!
//! ```text
//! <root>/<variable>_<statistic>/<year>/<MM>/<variable>_<statistic>_<year>_<MM>_<DD>.<ext>
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use raster_common::Statistic;

/// Identity of one daily summary raster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputKey {
    pub variable: String,
    pub statistic: Statistic,
    pub date: NaiveDate,
}

impl OutputKey {
    pub fn new(variable: impl Into<String>, statistic: Statistic, date: NaiveDate) -> Self {
        Self {
            variable: variable.into(),
            statistic,
            date,
        }
    }

    /// `<variable>_<statistic>`, the top-level directory name.
    pub fn product(&self) -> String {
        format!("{}_{}", self.variable, self.statistic)
    }
}

impl fmt::Display for OutputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.product(), self.date)
    }
}

/// Maps output keys to file paths under a root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
    extension: String,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        let extension: String = extension.into();
        Self {
            root: root.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Path relative to the root.
    pub fn relative_path(&self, key: &OutputKey) -> PathBuf {
        let product = key.product();
        let year = key.date.year();
        let month = key.date.month();
        let file = format!(
            "{}_{}_{:02}_{:02}.{}",
            product,
            year,
            month,
            key.date.day(),
            self.extension
        );
        PathBuf::from(product)
            .join(year.to_string())
            .join(format!("{:02}", month))
            .join(file)
    }

    pub fn path_for(&self, key: &OutputKey) -> PathBuf {
        self.root.join(self.relative_path(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_is_deterministic() {
        let layout = OutputLayout::new("/data/out", "tif");
        let key = OutputKey::new("t2m", Statistic::Max, NaiveDate::from_ymd_opt(2021, 3, 5).unwrap());
        assert_eq!(
            layout.relative_path(&key),
            PathBuf::from("t2m_max/2021/03/t2m_max_2021_03_05.tif")
        );
        assert_eq!(
            layout.path_for(&key),
            PathBuf::from("/data/out/t2m_max/2021/03/t2m_max_2021_03_05.tif")
        );
    }

    #[test]
    fn test_extension_normalised() {
        let layout = OutputLayout::new("out", ".tiff");
        let key = OutputKey::new("tp", Statistic::Sum, NaiveDate::from_ymd_opt(2020, 12, 31).unwrap());
        assert_eq!(
            layout.relative_path(&key),
            PathBuf::from("tp_sum/2020/12/tp_sum_2020_12_31.tiff")
        );
        assert_eq!(key.to_string(), "tp_sum 2020-12-31");
    }
}
