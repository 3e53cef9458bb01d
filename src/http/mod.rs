//! HTTP/1.1 transport.
//!
//! One request per connection: no keep-alive, no chunked encoding.
//!
//! - **`connection`**: Lifecycle of one accepted connection
//! - **`parser`**: Reads a request off a byte stream
//! - **`request`**: Request representation and header helpers
//! - **`response`**: Response representation with builder pattern
//! - **`writer`**: Serializes and writes responses to the client

pub mod connection;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
