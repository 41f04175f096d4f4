//! Closed value sets shared by the config model and the manifest builder.

use serde::Serialize;

/// An enumeration whose accepted spellings are fixed and listable.
pub trait ClosedEnum: Sized + Copy {
    /// Every accepted spelling, in documentation order.
    const VALUES: &'static [&'static str];

    fn parse(value: &str) -> Option<Self>;

    fn as_str(self) -> &'static str;
}

/// Kind of detection the wrapped inference service performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlgorithmType {
    /// One tile per request.
    #[serde(rename = "objectDetectionAOI")]
    ObjectDetection,
    /// Two tiles (before/after) per request.
    #[serde(rename = "changeDetectionAOI")]
    ChangeDetection,
}

impl ClosedEnum for AlgorithmType {
    const VALUES: &'static [&'static str] = &["objectDetectionAOI", "changeDetectionAOI"];

    fn parse(value: &str) -> Option<Self> {
        match value {
            "objectDetectionAOI" => Some(Self::ObjectDetection),
            "changeDetectionAOI" => Some(Self::ChangeDetection),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::ObjectDetection => "objectDetectionAOI",
            Self::ChangeDetection => "changeDetectionAOI",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Data,
    Processing,
}

impl ClosedEnum for BlockType {
    const VALUES: &'static [&'static str] = &["data", "processing"];

    fn parse(value: &str) -> Option<Self> {
        match value {
            "data" => Some(Self::Data),
            "processing" => Some(Self::Processing),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Processing => "processing",
        }
    }
}

/// Machine size the platform schedules the block on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineType {
    Small,
    Medium,
    Large,
    Xlarge,
    #[serde(rename = "gpu_nvidia_tesla_k80")]
    GpuNvidiaTeslaK80,
}

impl MachineType {
    pub fn is_accelerated(self) -> bool {
        matches!(self, Self::GpuNvidiaTeslaK80)
    }
}

impl ClosedEnum for MachineType {
    const VALUES: &'static [&'static str] =
        &["small", "medium", "large", "xlarge", "gpu_nvidia_tesla_k80"];

    fn parse(value: &str) -> Option<Self> {
        match value {
            "small" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            "large" => Some(Self::Large),
            "xlarge" => Some(Self::Xlarge),
            "gpu_nvidia_tesla_k80" => Some(Self::GpuNvidiaTeslaK80),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Xlarge => "xlarge",
            Self::GpuNvidiaTeslaK80 => "gpu_nvidia_tesla_k80",
        }
    }
}

impl std::fmt::Display for AlgorithmType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
