//! The simulation clock (IxTime). All auction timing runs on simulation
//! time so that deadlines are decoupled from wall-clock time; the database
//! never uses `NOW()` for anything the engine compares against.

use chrono::{DateTime, Duration, Utc};

#[cfg_attr(test, mockall::automock)]
pub trait SimClock: Send + Sync {
    /// The current simulation time.
    fn now(&self) -> DateTime<Utc>;
}

/// Maps wall-clock time onto the simulation timeline: at `anchor` (wall
/// clock) the simulation showed `epoch`, and it has advanced `multiplier`
/// times faster ever since.
#[derive(Clone, Debug)]
pub struct IxClock {
    pub epoch: DateTime<Utc>,
    pub anchor: DateTime<Utc>,
    pub multiplier: f64,
}

impl IxClock {
    fn at(&self, wall: DateTime<Utc>) -> DateTime<Utc> {
        let elapsed = wall - self.anchor;
        let scaled = (elapsed.num_milliseconds() as f64 * self.multiplier).round();
        // Saturate instead of wrapping on absurd configurations.
        let scaled = if scaled >= i64::MAX as f64 {
            i64::MAX
        } else if scaled <= i64::MIN as f64 {
            i64::MIN
        } else {
            // Guarded above, so the cast cannot wrap.
            #[allow(clippy::cast_possible_truncation)]
            {
                scaled as i64
            }
        };
        self.epoch + Duration::milliseconds(scaled)
    }
}

impl SimClock for IxClock {
    fn now(&self) -> DateTime<Utc> {
        self.at(Utc::now())
    }
}

/// A clock frozen at a fixed instant. Only useful in tests.
#[derive(Clone, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl SimClock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
