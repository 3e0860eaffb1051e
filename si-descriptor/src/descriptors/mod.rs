//! Built-in descriptor kinds.

pub mod application_usage;
pub mod eutelsat_channel_number;
pub mod logical_channel_number;
pub mod private_data_specifier;
pub mod service_list;
pub mod stream_identifier;

pub use application_usage::ApplicationUsageDescriptor;
pub use eutelsat_channel_number::EutelsatChannelNumberDescriptor;
pub use logical_channel_number::LogicalChannelNumberDescriptor;
pub use private_data_specifier::PrivateDataSpecifierDescriptor;
pub use service_list::ServiceListDescriptor;
pub use stream_identifier::StreamIdentifierDescriptor;

use crate::error::DescriptorError;
use crate::registry::RegistryBuilder;

/// Register every built-in kind, in a fixed order.
pub fn register_all(builder: &mut RegistryBuilder) -> Result<(), DescriptorError> {
    PrivateDataSpecifierDescriptor::register(builder)?;
    ServiceListDescriptor::register(builder)?;
    StreamIdentifierDescriptor::register(builder)?;
    ApplicationUsageDescriptor::register(builder)?;
    EutelsatChannelNumberDescriptor::register(builder)?;
    LogicalChannelNumberDescriptor::register(builder)?;
    Ok(())
}
