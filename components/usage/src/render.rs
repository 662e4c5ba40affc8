use std::fmt;

use serde::Serialize;

use crate::{model::UsageSnapshot, unit::Unit};

/// The values a status bar item formats, named the way the front end
/// expects them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderProps {
    pub disk_used:         f64,
    pub disk_total:        Option<f64>,
    pub units:             Unit,
    pub usage_warning:     bool,
    pub metrics_available: bool,
}

impl From<&UsageSnapshot> for RenderProps {
    fn from(s: &UsageSnapshot) -> Self {
        Self {
            disk_used:         s.used(),
            disk_total:        s.total(),
            units:             s.unit(),
            usage_warning:     s.warn(),
            metrics_available: s.available(),
        }
    }
}

// Disk: 5.00 / 20.00 GB
impl fmt::Display for RenderProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.metrics_available {
            return f.write_str("Disk: -");
        }
        write!(f, "Disk: {:.2}", self.disk_used)?;
        if let Some(total) = self.disk_total {
            write!(f, " / {:.2}", total)?;
        }
        write!(f, " {}", self.units)?;
        if self.usage_warning {
            f.write_str(" (!)")?;
        }
        Ok(())
    }
}
