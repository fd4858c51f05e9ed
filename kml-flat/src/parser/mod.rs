//! Parsers KML

pub mod element;
pub mod placemark;
pub mod prolog;
