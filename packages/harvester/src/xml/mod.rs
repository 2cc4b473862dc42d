//! XML navigation helpers.

mod utils;

pub use utils::{
    find_all_by_path, find_by_path, find_child, find_children, find_descendant,
    find_descendants, get_tag_name, get_text, has_tag, non_empty_text, xml_lang,
};
