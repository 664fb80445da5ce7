// vim: tw=80

//! Cross-module scenarios exercised through the public API only

mod checksum;
mod raid;
