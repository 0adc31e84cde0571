//! Embedded static resources.
//!
//! # Module Structure
//!
//! - `template` - Template types for typed placeholder substitution
//! - `scaffold` - Built-in page boilerplates (`template.hbs/.scss/.js`)
//! - `serve` - Dev server live-reload client
//!
//! # Usage
//!
//! ```ignore
//! use embed::scaffold::{PAGE_HBS, PageVars};
//! use embed::serve::{LIVERELOAD_JS, LivereloadVars};
//!
//! let markup = PAGE_HBS.render(&PageVars::new("about"));
//! let js = LIVERELOAD_JS.render(&LivereloadVars { ws_port: 35729 });
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod scaffold {
    use super::{Template, TemplateVars};

    /// Token replaced by the page name in every boilerplate.
    pub const PAGE_NAME_PLACEHOLDER: &str = "NEW_PAGE_TITLE";

    /// Variables for page boilerplates.
    #[derive(Debug, Clone)]
    pub struct PageVars {
        pub page_name: String,
    }

    impl PageVars {
        pub fn new(page_name: impl Into<String>) -> Self {
            Self {
                page_name: page_name.into(),
            }
        }
    }

    impl TemplateVars for PageVars {
        fn apply(&self, content: &str) -> String {
            content.replace(PAGE_NAME_PLACEHOLDER, &self.page_name)
        }
    }

    /// Default view markup.
    pub const PAGE_HBS: Template<PageVars> =
        Template::new(include_str!("scaffold/template.hbs"));

    /// Default style fragment.
    pub const PAGE_SCSS: Template<PageVars> =
        Template::new(include_str!("scaffold/template.scss"));

    /// Default script fragment.
    pub const PAGE_JS: Template<PageVars> =
        Template::new(include_str!("scaffold/template.js"));
}

pub mod serve {
    use super::{Template, TemplateVars};

    /// Path the dev server answers with the live-reload client.
    pub const LIVERELOAD_URL: &str = "/__pagesmith/livereload.js";

    /// Variables for livereload.js.
    pub struct LivereloadVars {
        pub ws_port: u16,
    }

    impl TemplateVars for LivereloadVars {
        fn apply(&self, content: &str) -> String {
            content.replace("__PAGESMITH_WS_PORT__", &self.ws_port.to_string())
        }
    }

    /// Live-reload client (minified by build.rs).
    pub const LIVERELOAD_JS: Template<LivereloadVars> = Template::new(include_str!(concat!(
        env!("OUT_DIR"),
        "/livereload.min.js"
    )));

    /// `<script>` tag injected before `</body>`.
    pub fn script_tag() -> String {
        format!(r#"<script src="{LIVERELOAD_URL}"></script>"#)
    }
}
