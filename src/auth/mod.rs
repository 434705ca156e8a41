// Guest identity
//
// Guests are anonymous: logging in mints an opaque UUID that later calls
// present as their player id. Authentication strength is explicitly out of
// scope; validity is a membership check against the ids this process has
// issued, mirrored with a TTL so a restarted process can be reseeded.

use std::collections::HashSet;
use std::sync::RwLock;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::storage::{keys, Mirror};

pub struct GuestDirectory {
    guests: RwLock<HashSet<String>>,
    mirror: Mirror,
    ttl: Duration,
}

impl GuestDirectory {
    pub fn new(mirror: Mirror, ttl: Duration) -> Self {
        Self {
            guests: RwLock::new(HashSet::new()),
            mirror,
            ttl,
        }
    }

    /// Issues a fresh guest id
    #[instrument(skip(self))]
    pub async fn issue(&self) -> String {
        let guest_id = Uuid::new_v4().to_string();

        {
            let mut guests = self.guests.write().unwrap();
            guests.insert(guest_id.clone());
        }

        self.mirror.set(
            keys::guest_key(&guest_id),
            guest_id.clone(),
            Some(self.ttl),
        );

        info!(guest_id = %guest_id, "Guest id issued");
        guest_id
    }

    /// Whether this id was issued by the directory. Blank ids are invalid.
    pub async fn is_valid(&self, guest_id: &str) -> bool {
        if guest_id.trim().is_empty() {
            return false;
        }

        let guests = self.guests.read().unwrap();
        guests.contains(guest_id)
    }
}
