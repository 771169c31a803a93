/// Maximum upload size in bytes (100MB, matching the print-file limit)
pub const MAX_FILE_SIZE: usize = 100 * 1024 * 1024;

/// Allowed upload extensions: archive and document formats only
pub const ALLOWED_EXTENSIONS: &[&str] = &["zip", "rar", "7z", "pdf"];

/// Allowed upload MIME types, matching [`ALLOWED_EXTENSIONS`]
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/zip",
    "application/x-zip-compressed",
    "application/vnd.rar",
    "application/x-rar-compressed",
    "application/x-7z-compressed",
    "application/pdf",
];

/// Path prefix where local upload files are served statically
pub const UPLOADS_PUBLIC_PREFIX: &str = "/uploads";
