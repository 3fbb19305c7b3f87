pub mod device;
pub mod dtos;
pub mod history;
pub mod import;
pub mod permission;
pub mod profile;
pub mod user;

pub use device::{Device, DeviceDraft, DeviceProfile, SensorStates};
pub use history::{DeviceEvent, EntryKind, EntryStatus, HistoryEntry, TimeWindow, UserEvent};
pub use import::{DEVICE_IMPORT_COLUMNS, ImportFile, USER_IMPORT_COLUMNS, import_template};
pub use permission::{Permission, PermissionDraft};
pub use profile::Profile;
pub use user::{Schedule, User, UserDraft, UserPatch};
