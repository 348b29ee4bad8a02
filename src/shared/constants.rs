// =============================================================================
// SUBMISSION LIMITS
// =============================================================================

/// Minimum number of photos a submission must carry
pub const MIN_IMAGES: usize = 1;

/// Maximum number of photos a submission may carry
pub const MAX_IMAGES: usize = 5;

/// Character limit for the optional free-text comment
pub const MAX_COMMENT_CHARS: usize = 500;

/// Hard cap on rows returned by the public report listing
pub const REPORTS_LIST_CAP: i64 = 1000;

/// Settlement sentinel that requires a custom settlement name
pub const SETTLEMENT_OTHER: &str = "Other";

/// Extension used when an uploaded file has no usable one
pub const DEFAULT_PHOTO_EXTENSION: &str = "jpg";

/// Content type used when an uploaded file declares none
pub const DEFAULT_PHOTO_CONTENT_TYPE: &str = "image/jpeg";

/// Client identity used when no forwarding headers are present
pub const UNKNOWN_CLIENT_ID: &str = "unknown";

// =============================================================================
// USER-FACING COPY (Bulgarian domain copy, English operational copy)
// =============================================================================

/// Required submission fields missing or unparsable
pub const MSG_INVALID_FIELDS: &str = "Липсват задължителни полета или невалидни данни.";

/// Settlement "Other" chosen without a custom settlement name
pub const MSG_CUSTOM_SETTLEMENT_REQUIRED: &str = "При избор \"Друго\" въведете населено място.";

/// Photo count outside the allowed 1..=5 range
pub const MSG_IMAGE_COUNT: &str = "Добавете между 1 и 5 снимки.";

/// A photo exceeds the per-file byte ceiling
pub const MSG_IMAGE_TOO_LARGE: &str =
    "Снимката е твърде голяма. Моля, използвайте по-малка снимка.";

/// A file that declares a non-image content type
pub const MSG_NOT_AN_IMAGE: &str = "Файлът трябва да е изображение.";

/// Comment longer than the character limit
pub const MSG_COMMENT_TOO_LONG: &str = "Коментарът е твърде дълъг (до 500 знака).";

/// Same client submitted again inside the cooldown window
pub const MSG_RATE_LIMITED: &str = "Твърде много опити. Опитайте след няколко минути.";

/// Database or storage credentials absent at runtime
pub const MSG_BACKEND_UNCONFIGURED: &str =
    "Сървърът не е конфигуриран. Добавете ключовете за базата данни и хранилището в .env.";

/// Report row insert failed
pub const MSG_REPORT_INSERT_FAILED: &str = "Грешка при запис. Опитайте отново.";

/// Photo bucket could not be created; call sites append the operator hint
pub const MSG_BUCKET_CREATE_FAILED: &str = "Грешка при създаване на хранилище за снимки.";

/// Photo upload failed
pub const MSG_UPLOAD_FAILED: &str = "Грешка при качване на снимки.";

/// Multipart body could not be parsed
pub const MSG_INVALID_BODY: &str = "Invalid body";

/// Cleanup trigger without a matching bearer secret
pub const MSG_UNAUTHORIZED: &str = "Unauthorized";

/// Cleanup deletions failed mid-way
pub const MSG_CLEANUP_FAILED: &str = "Cleanup failed";

/// Cleanup invoked while the backend is unconfigured
pub const MSG_SERVER_ERROR: &str = "Server error";

/// Public listing could not be read from the store
pub const MSG_LOAD_REPORTS_FAILED: &str = "Failed to load reports";
