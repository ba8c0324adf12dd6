//! Integration tests: full monitor cycles against in-memory marketplaces.

mod cycle;
mod mock_marketplace;
