//! Phytochemical lookup on IMPPAT with spreadsheet export and bulk 3D SDF
//! retrieval from PubChem or IMPPAT.

pub mod app;
pub mod config;
pub mod domain;
pub mod downloader;
pub mod error;
pub mod fs_util;
pub mod http;
pub mod imppat;
pub mod output;
pub mod pubchem;
pub mod resolver;
pub mod spreadsheet;
pub mod table;
pub mod workspace;
