pub mod camera_reading;
pub mod zone_alert;
pub mod zone_alert_event;

pub use camera_reading::Entity as CameraReading;
pub use zone_alert::Entity as ZoneAlert;
pub use zone_alert_event::Entity as ZoneAlertEvent;
