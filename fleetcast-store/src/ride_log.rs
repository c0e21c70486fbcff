use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fleetcast_core::{CoreError, CoreResult, Ride};

/// Append-only ride log, one JSON document per line. Appends are serialized
/// through a mutex so concurrent submissions cannot interleave lines.
pub struct RideLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl RideLog {
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| CoreError::Store(format!("cannot open {}: {}", path.display(), e)))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn append(&self, ride: &Ride) -> CoreResult<()> {
        let line = serde_json::to_string(ride)
            .map_err(|e| CoreError::Store(format!("cannot serialize ride: {}", e)))?;
        let mut file = self
            .file
            .lock()
            .map_err(|_| CoreError::Store("ride log lock poisoned".to_string()))?;
        writeln!(file, "{}", line)
            .and_then(|_| file.flush())
            .map_err(|e| CoreError::Store(format!("cannot append to {}: {}", self.path.display(), e)))?;
        tracing::debug!(ride_id = %ride.id, "appended ride to log");
        Ok(())
    }

    /// Read the full log back. Used by tests and operational tooling, not by
    /// the request path.
    pub fn replay(&self) -> CoreResult<Vec<Ride>> {
        let file = File::open(&self.path)
            .map_err(|e| CoreError::Store(format!("cannot read {}: {}", self.path.display(), e)))?;
        let mut rides = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line
                .map_err(|e| CoreError::Store(format!("cannot read {}: {}", self.path.display(), e)))?;
            if line.trim().is_empty() {
                continue;
            }
            let ride = serde_json::from_str(&line)
                .map_err(|e| CoreError::Store(format!("corrupt ride log entry: {}", e)))?;
            rides.push(ride);
        }
        Ok(rides)
    }
}
