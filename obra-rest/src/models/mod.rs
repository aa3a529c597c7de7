mod company;
mod contact;
mod project;

pub use company::{AboutUs, Category, ClientLogo, CompanyInfo, Service};
pub use contact::{ContactMessage, ContactMessageRequest};
pub use obra_auth::User;
pub use project::{Project, ProjectImage, ProjectStatus, ProjectVideo};
