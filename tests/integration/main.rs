//! Integration tests: the full engine against in-memory collaborators.

mod mock_gateway;
mod round_lifecycle;
