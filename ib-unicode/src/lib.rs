//! Unicode utils.
/*!
## Features
- Fast [byte search](ascii) utils, used for prefilters
- [UTF-8](utf8) decoding in both directions and char boundary helpers for byte haystacks

## Crate features
*/
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(feature = "doc", doc = document_features::document_features!())]
pub mod ascii;
#[cfg(feature = "utf8")]
pub mod utf8;
