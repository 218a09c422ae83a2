/**
 * http module
 *
 * - address: address descriptors, proxy flags and transfer envelopes
 * - params: ordered query parameter multimap
 * - call: outbound call specification
 * - decorator: envelope -> call decoration and the decorator chain
 * - source: agent source producing response parts
 * - transport: reqwest call executor
 */

pub mod address;
pub mod call;
pub mod decorator;
pub mod params;
pub mod source;
pub mod transport;

pub use address::{AddressDescriptor, Field, FieldSource, ProxyFlags, TransferEnvelope};
pub use call::CallSpec;
pub use decorator::{AgentParamsDecorator, DecoratorChain, HeaderDecorator, ParamsDecorator};
pub use params::QueryParams;
pub use source::{AgentSource, CallExecutor, CallResponse, Part, Warning};
pub use transport::HttpTransport;
