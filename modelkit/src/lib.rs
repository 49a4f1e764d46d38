//! modelkit — composable model extensions over a relational client.
//!
//! This facade crate re-exports the modelkit sub-crates through a single
//! dependency with feature flags. Import everything you need with:
//!
//! ```ignore
//! use modelkit::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature    | Default | Crate                           |
//! |------------|---------|---------------------------------|
//! | `sqlx`     | no      | `modelkit-data-sqlx` (SQLite)   |
//! | `sqlite`   | no      | `modelkit-data-sqlx/sqlite`     |
//! | `postgres` | no      | `modelkit-data-sqlx/postgres`   |
//! | `test`     | no      | `modelkit-test`                 |

pub use modelkit_data;
pub use modelkit_data::*;

#[cfg(feature = "sqlx")]
pub use modelkit_data_sqlx;

#[cfg(feature = "test")]
pub use modelkit_test;

pub mod prelude {
    //! Everything a typical caller needs.
    pub use modelkit_data::prelude::*;
    pub use modelkit_data::{CreateArgs, ResourceList, SoftDeleteSpec, StorageCode};

    #[cfg(feature = "sqlx")]
    pub use modelkit_data_sqlx::{run_seeders, Db, Seeder, SqlxErrorExt, SqlxModel, UnitOfWork};
}
