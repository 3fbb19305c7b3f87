pub mod auth;
pub mod device;
pub mod device_status;
pub mod history;
pub mod permission;
pub mod session;
pub mod user;

pub use auth::AuthService;
pub use device::DeviceService;
pub use history::HistoryService;
pub use permission::PermissionService;
pub use session::SessionStore;
pub use user::UserService;
