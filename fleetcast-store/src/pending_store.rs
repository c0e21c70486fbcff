use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fleetcast_core::pending::find_matches;
use fleetcast_core::{CoreError, CoreResult, PendingReturnRequest, ReturnMatch, ZoneId};

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum JournalRecord {
    Add { request: PendingReturnRequest },
    Claim { id: Uuid },
}

struct Inner {
    file: File,
    open_requests: Vec<PendingReturnRequest>,
}

/// The set of open return-trip requests, journaled to disk. Matching removes
/// requests and writes their claim records inside the same critical section,
/// so two near-simultaneous rides cannot claim one request twice and a
/// restart cannot resurrect a claimed request.
pub struct PendingStore {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl PendingStore {
    /// Open the store, rebuilding the in-memory set from the journal.
    /// Requests whose window already closed are dropped during replay.
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        Self::open_at(path, Utc::now())
    }

    fn open_at(path: impl AsRef<Path>, now: DateTime<Utc>) -> CoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut open_requests = Vec::new();

        if path.exists() {
            let file = File::open(&path)
                .map_err(|e| CoreError::Store(format!("cannot read {}: {}", path.display(), e)))?;
            for line in BufReader::new(file).lines() {
                let line = line.map_err(|e| {
                    CoreError::Store(format!("cannot read {}: {}", path.display(), e))
                })?;
                if line.trim().is_empty() {
                    continue;
                }
                let record: JournalRecord = serde_json::from_str(&line)
                    .map_err(|e| CoreError::Store(format!("corrupt journal entry: {}", e)))?;
                match record {
                    JournalRecord::Add { request } => open_requests.push(request),
                    JournalRecord::Claim { id } => open_requests.retain(|r| r.id != id),
                }
            }
        }

        let before = open_requests.len();
        open_requests.retain(|r| !r.is_expired(now));
        if before > open_requests.len() {
            tracing::info!(dropped = before - open_requests.len(), "dropped expired pending requests");
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| CoreError::Store(format!("cannot open {}: {}", path.display(), e)))?;

        Ok(Self {
            path,
            inner: Mutex::new(Inner {
                file,
                open_requests,
            }),
        })
    }

    pub fn insert(&self, request: PendingReturnRequest) -> CoreResult<()> {
        let mut inner = self.lock()?;
        self.journal(&mut inner, &JournalRecord::Add {
            request: request.clone(),
        })?;
        tracing::debug!(request_id = %request.id, zone = request.zone, "registered pending return request");
        inner.open_requests.push(request);
        Ok(())
    }

    /// Atomically select and remove every open request satisfied by the new
    /// ride's pickup, ordered closest-match-first. A request claimed here can
    /// never match again.
    pub fn match_and_claim(
        &self,
        pickup: ZoneId,
        pickup_time: DateTime<Utc>,
        within_tolerance: impl Fn(ZoneId, ZoneId) -> bool,
    ) -> CoreResult<Vec<ReturnMatch>> {
        let mut inner = self.lock()?;
        let claimed: Vec<PendingReturnRequest> =
            find_matches(&inner.open_requests, pickup, pickup_time, within_tolerance)
                .into_iter()
                .cloned()
                .collect();

        // Journal and remove each claim in the same step, so a failed write
        // cannot leave a request journaled as claimed yet still matchable
        let mut matches = Vec::with_capacity(claimed.len());
        for request in claimed {
            self.journal(&mut inner, &JournalRecord::Claim { id: request.id })?;
            inner.open_requests.retain(|r| r.id != request.id);
            matches.push(ReturnMatch::new(&request, pickup_time));
        }
        Ok(matches)
    }

    pub fn open_len(&self) -> CoreResult<usize> {
        Ok(self.lock()?.open_requests.len())
    }

    fn lock(&self) -> CoreResult<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| CoreError::Store("pending store lock poisoned".to_string()))
    }

    fn journal(&self, inner: &mut Inner, record: &JournalRecord) -> CoreResult<()> {
        let line = serde_json::to_string(record)
            .map_err(|e| CoreError::Store(format!("cannot serialize journal record: {}", e)))?;
        writeln!(inner.file, "{}", line)
            .and_then(|_| inner.file.flush())
            .map_err(|e| CoreError::Store(format!("cannot append to {}: {}", self.path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(min: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap() + Duration::minutes(min)
    }

    fn request(zone: ZoneId, start_min: i64, end_min: i64) -> PendingReturnRequest {
        PendingReturnRequest {
            id: Uuid::new_v4(),
            zone,
            return_to: 1,
            window_start: t(start_min),
            window_end: t(end_min),
            passengers: 2,
        }
    }

    #[test]
    fn claimed_request_cannot_match_twice() {
        let dir = tempfile::tempdir().unwrap();
        let store = PendingStore::open(dir.path().join("pending.jsonl")).unwrap();
        store.insert(request(5, 0, 60)).unwrap();

        let first = store.match_and_claim(5, t(10), |_, _| false).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].time_difference_minutes, 10);

        let second = store.match_and_claim(5, t(11), |_, _| false).unwrap();
        assert!(second.is_empty());
        assert_eq!(store.open_len().unwrap(), 0);
    }

    #[test]
    fn claims_survive_a_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pending.jsonl");

        let store = PendingStore::open_at(&path, t(0)).unwrap();
        store.insert(request(5, 0, 60)).unwrap();
        store.insert(request(6, 0, 60)).unwrap();
        store.match_and_claim(5, t(10), |_, _| false).unwrap();
        drop(store);

        let store = PendingStore::open_at(&path, t(20)).unwrap();
        assert_eq!(store.open_len().unwrap(), 1);
        assert!(store.match_and_claim(5, t(20), |_, _| false).unwrap().is_empty());
        assert_eq!(store.match_and_claim(6, t(20), |_, _| false).unwrap().len(), 1);
    }

    #[test]
    fn expired_requests_are_dropped_on_replay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pending.jsonl");

        let store = PendingStore::open_at(&path, t(0)).unwrap();
        store.insert(request(5, 0, 30)).unwrap();
        drop(store);

        let store = PendingStore::open_at(&path, t(31)).unwrap();
        assert_eq!(store.open_len().unwrap(), 0);
    }

    #[test]
    fn every_claim_is_removed_and_journaled_in_lockstep() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pending.jsonl");

        let store = PendingStore::open_at(&path, t(0)).unwrap();
        store.insert(request(5, 0, 60)).unwrap();
        store.insert(request(5, 5, 60)).unwrap();
        store.insert(request(5, 10, 60)).unwrap();

        let matches = store.match_and_claim(5, t(20), |_, _| false).unwrap();
        assert_eq!(matches.len(), 3);
        assert_eq!(store.open_len().unwrap(), 0);
        drop(store);

        // The journal agrees with what was matchable in-process
        let store = PendingStore::open_at(&path, t(20)).unwrap();
        assert_eq!(store.open_len().unwrap(), 0);
        assert!(store.match_and_claim(5, t(21), |_, _| false).unwrap().is_empty());
    }

    #[test]
    fn multiple_matches_come_back_closest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = PendingStore::open(dir.path().join("pending.jsonl")).unwrap();
        store.insert(request(5, 0, 60)).unwrap();
        store.insert(request(5, 15, 60)).unwrap();

        let matches = store.match_and_claim(5, t(20), |_, _| false).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].time_difference_minutes, 5);
        assert_eq!(matches[1].time_difference_minutes, 20);
    }
}
