pub mod event;
pub mod login;
pub mod model;
pub mod pharmacist;
pub mod portal;
pub mod storage;
pub mod sync;

pub use event::PortalEvent;
pub use login::{doctor_identity, doctors, patient_identity, LoginError, DOCTOR_PASSCODE};
pub use model::{Appointment, Language, MedicineInfo, Message, Role, TriageStatus, User};
pub use pharmacist::{LookupError, PharmacistClient};
pub use portal::Portal;
pub use storage::bridge::StorageBridge;
pub use storage::{ChangeStream, SharedStore, StorageError, StoreChange, StoreContext};
pub use sync::spawn_sync_listener;
