//! Common MIME types.
//!
//! Source: <https://developer.mozilla.org/en-US/docs/Web/HTTP/MIME_types/Common_types>

pub const BIN: &str = "application/octet-stream";
pub const CSV: &str = "text/csv";
pub const DOC: &str = "application/msword";
pub const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const GIF: &str = "image/gif";
pub const GZIP: &str = "application/gzip";
pub const HTML: &str = "text/html";
pub const JPEG: &str = "image/jpeg";
pub const JSON: &str = "application/json";
pub const PDF: &str = "application/pdf";
pub const PNG: &str = "image/png";
pub const RAR: &str = "application/vnd.rar";
pub const RTF: &str = "application/rtf";
pub const SVG: &str = "image/svg+xml";
pub const TAR: &str = "application/x-tar";
pub const TEXT: &str = "text/plain";
pub const X7ZIP: &str = "application/x-7z-compressed";
pub const XLS: &str = "application/vnd.ms-excel";
pub const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const XML: &str = "application/xml";
pub const ZIP: &str = "application/zip";
