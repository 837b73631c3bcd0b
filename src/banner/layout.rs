//! Positional layout of a banner table block.
//!
//! Every offset is relative to the marker row; every column is an absolute
//! 0-based index. The defaults describe a WinCross banner export.

use crate::error::BannerSheetError;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum LayoutError {
    #[error("Layout marker must not be empty")]
    EmptyMarkerError,

    #[error("Layout needs at least one segment column")]
    NoSegmentColumnsError,

    #[error("Metric stride {0} is too small, a metric spans 3 rows")]
    MetricStrideError(usize),

    #[error("Metric rows must start below the marker row")]
    MetricStartError,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct ScanLayout {
    /// Substring that marks the first row of a block
    pub(crate) marker: String,
    pub(crate) marker_column: usize,
    pub(crate) title_offset: usize,
    pub(crate) title_column: usize,
    /// Row holding banner column names; unnamed segments are numbered
    pub(crate) segment_name_offset: Option<usize>,
    pub(crate) base_count_offset: usize,
    pub(crate) metric_start_offset: usize,
    /// Raw rows per metric: frequency, percentage, significance
    pub(crate) metric_stride: usize,
    pub(crate) label_column: usize,
    pub(crate) segment_columns: Vec<usize>,
}

impl Default for ScanLayout {
    fn default() -> Self {
        ScanLayout {
            marker: "Table Title".to_string(),
            marker_column: 1,
            title_offset: 1,
            title_column: 1,
            segment_name_offset: None,
            base_count_offset: 6,
            metric_start_offset: 8,
            metric_stride: 3,
            label_column: 2,
            segment_columns: vec![3, 4, 5, 6],
        }
    }
}

impl ScanLayout {
    /// Reads a layout from a TOML file; absent keys keep their defaults.
    pub(crate) fn load<P: AsRef<Path>>(path: P) -> Result<Self, BannerSheetError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    pub(crate) fn parse(content: &str) -> Result<Self, BannerSheetError> {
        let layout: ScanLayout = toml::from_str(content)?;
        layout.validate()?;
        Ok(layout)
    }

    pub(crate) fn validate(&self) -> Result<(), LayoutError> {
        if self.marker.is_empty() {
            return Err(LayoutError::EmptyMarkerError);
        }
        if self.segment_columns.is_empty() {
            return Err(LayoutError::NoSegmentColumnsError);
        }
        if self.metric_stride < 3 {
            return Err(LayoutError::MetricStrideError(self.metric_stride));
        }
        // A zero offset would rescan the marker row forever
        if self.metric_start_offset == 0 {
            return Err(LayoutError::MetricStartError);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_the_default_layout() {
        assert_eq!(ScanLayout::parse("").unwrap(), ScanLayout::default());
    }

    #[test]
    fn overrides_selected_fields() {
        let layout = ScanLayout::parse(r#"
            marker = "Banner Title"
            segment_columns = [3, 4, 5, 6, 7, 8]
            segment_name_offset = 4
        "#).unwrap();
        assert_eq!(layout.marker, "Banner Title");
        assert_eq!(layout.segment_columns.len(), 6);
        assert_eq!(layout.segment_name_offset, Some(4));
        assert_eq!(layout.base_count_offset, 6);
        assert_eq!(layout.metric_stride, 3);
    }

    #[test]
    fn rejects_unusable_layouts() {
        assert!(matches!(
            ScanLayout::parse("marker = \"\"").unwrap_err(),
            BannerSheetError::LayoutError(LayoutError::EmptyMarkerError)
        ));
        assert!(matches!(
            ScanLayout::parse("segment_columns = []").unwrap_err(),
            BannerSheetError::LayoutError(LayoutError::NoSegmentColumnsError)
        ));
        assert!(matches!(
            ScanLayout::parse("metric_stride = 2").unwrap_err(),
            BannerSheetError::LayoutError(LayoutError::MetricStrideError(2))
        ));
        assert!(matches!(
            ScanLayout::parse("metric_start_offset = 0").unwrap_err(),
            BannerSheetError::LayoutError(LayoutError::MetricStartError)
        ));
    }

    #[test]
    fn wrong_types_are_toml_errors() {
        assert!(matches!(
            ScanLayout::parse("label_column = \"C\"").unwrap_err(),
            BannerSheetError::TomlError(_)
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            ScanLayout::load("/nonexistent/layout.toml").unwrap_err(),
            BannerSheetError::IoError(_)
        ));
    }
}
