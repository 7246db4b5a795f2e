// Domain models

mod category;
mod descriptor;
mod entity;
mod value;

pub use category::{Category, InstallIndex};
pub use descriptor::{AttributeDescriptor, FieldDescriptor, NonePolicy, SemanticType};
pub use entity::{DeviceInfo, EntityView};
pub use value::{PublishedState, Reading, SensorValue};
