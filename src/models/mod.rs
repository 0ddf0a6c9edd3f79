pub mod medication;
pub mod notification_record;
pub mod profile;
pub mod push_subscription;
pub mod user_role;

#[allow(unused_imports)]
pub mod prelude {
    pub use super::medication::{self, Entity as Medication};
    pub use super::notification_record::{self, Entity as NotificationRecord};
    pub use super::profile::{self, Entity as Profile};
    pub use super::push_subscription::{self, Entity as PushSubscription};
    pub use super::user_role::{self, Entity as UserRole};
}
