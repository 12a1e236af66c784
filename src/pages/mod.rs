//! Page controllers. Each one reads what its page needs from storage,
//! delegates work to the feature services and says where to go next.

pub mod home;
pub mod loading;
pub mod result;
pub mod settings;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Index,
    Settings,
    Loading,
    Result,
}

impl Page {
    pub fn path(&self) -> &'static str {
        match self {
            Page::Index => "index.html",
            Page::Settings => "settings.html",
            Page::Loading => "loading.html",
            Page::Result => "result.html",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
