//! Generic batch loader
//!
//! Components:
//! - `mapping`: record field mapping and add-data merge
//! - `entity_loader`: pass 1 (create) and pass 2 (resolve references)
//! - `secondary`: owner entities generated from grouped child records
//! - `clusters`: pairwise cluster edges
//! - `links`: cross-site link index
//! - `premium`: premium user allow-list
//! - `presets`: mappings of the scraped game, collection and user records

pub mod clusters;
pub mod entity_loader;
pub mod links;
pub mod mapping;
pub mod premium;
pub mod presets;
pub mod secondary;

pub use clusters::cluster_pairs;
pub use entity_loader::{collect_references, make_entity, EntityLoader, ReferenceSpec, RelationUpdate};
pub use links::LinkIndex;
pub use mapping::{merge_missing, AddData, FieldMapping};
pub use premium::load_premium_users;
pub use secondary::{OwnedBy, SecondaryItem, SecondaryItems};
