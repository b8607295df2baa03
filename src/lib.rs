//! # SQL Endpoints
//!
//! Turn an annotated SQL text into a callable, typed query operation.
//!
//! A source file carries its routing and parameter metadata as directive
//! comments and `DECLARE` statements:
//!
//! ```sql
//! -- @method POST
//! -- @auth bearer token-a,token-b
//! -- @param limit: int = 10
//! -- @countQuery
//! SELECT COUNT(*) FROM users;
//! SELECT * FROM users WHERE id = @id;
//! ```
//!
//! [`parse`] turns that text into a [`ParsedQuery`] once; [`pipeline::execute`]
//! then handles each request against it: method check, auth check, parameter
//! resolution and coercion, optional count execution, main execution, and
//! response shaping.
//!
//! The database itself stays outside this crate. The surrounding service owns
//! the connection or pool and exposes it through the [`QueryGateway`] trait;
//! the pipeline only borrows it per call.

pub mod auth;
pub mod error;
pub mod gateway;
pub mod params;
pub mod parser;
pub mod pipeline;
pub mod registry;
pub mod request;

pub use auth::AuthRequirement;
pub use error::EndpointError;
pub use gateway::{QueryGateway, Row};
pub use params::{ParamMeta, ParamType, ParamValue, ResolvedParams};
pub use parser::{parse, ParsedQuery};
pub use pipeline::{execute, EndpointResponse};
pub use registry::EndpointRegistry;
pub use request::{EndpointRequest, HttpMethod};
