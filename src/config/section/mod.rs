//! Configuration section definitions.
//!
//! Each module corresponds to a section in `pagesmith.toml`:
//!
//! | Module     | TOML Section   | Purpose                              |
//! |------------|----------------|--------------------------------------|
//! | `build`    | `[build]`      | Source and output directories        |
//! | `scaffold` | `[scaffold]`   | Boilerplate location for new pages   |
//! | `script`   | `[script]`     | Bundle entry, global, syntax target  |
//! | `serve`    | `[serve]`      | Development server                   |
//! | `style`    | `[style]`      | Stylesheet entry and browser targets |

mod build;
mod scaffold;
mod script;
mod serve;
mod style;

pub use build::BuildSectionConfig;
pub use scaffold::ScaffoldConfig;
pub use script::ScriptConfig;
pub use serve::ServeConfig;
pub use style::StyleConfig;
