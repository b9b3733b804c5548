//! File-type categories and their extension lists.

/// A file-type category matched against a record's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Audio,
    Images,
    Models,
    Materials,
    Shaders,
    Scripts,
    Video,
    Fonts,
    Documents,
    Archives,
}

// ---------------------------------------------------------------------------
// Extension category constants
// ---------------------------------------------------------------------------

pub const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "flac", "aac", "ogg", "oga", "opus", "wma", "m4a", "aif", "aiff", "mod", "it",
    "s3m", "xm",
];

pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "tga", "tif", "tiff", "psd", "exr", "hdr", "webp", "dds",
    "iff", "pict", "svg",
];

pub const MODEL_EXTENSIONS: &[&str] = &[
    "fbx", "obj", "blend", "dae", "3ds", "dxf", "max", "ma", "mb", "gltf", "glb", "usd", "usdz",
    "stl", "ply",
];

pub const MATERIAL_EXTENSIONS: &[&str] = &["mat", "physicmaterial", "sbsar", "cubemap"];

pub const SHADER_EXTENSIONS: &[&str] = &[
    "shader", "shadergraph", "shadersubgraph", "compute", "cginc", "hlsl", "glsl", "raytrace",
];

pub const SCRIPT_EXTENSIONS: &[&str] = &["cs", "js", "boo", "dll", "asmdef", "lua", "py"];

pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "mov", "avi", "mkv", "wmv", "webm", "mpg", "mpeg", "ogv",
];

pub const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "fnt", "fon", "woff", "woff2"];

pub const DOCUMENT_EXTENSIONS: &[&str] = &[
    "txt", "md", "pdf", "doc", "docx", "rtf", "odt", "html", "htm", "json", "xml", "csv", "yaml",
];

pub const ARCHIVE_EXTENSIONS: &[&str] = &[
    "zip", "rar", "7z", "tar", "gz", "tgz", "bz2", "xz", "unitypackage",
];

impl TypeCategory {
    /// All categories in selector display order.
    pub const ALL: [TypeCategory; 10] = [
        Self::Audio,
        Self::Images,
        Self::Models,
        Self::Materials,
        Self::Shaders,
        Self::Scripts,
        Self::Video,
        Self::Fonts,
        Self::Documents,
        Self::Archives,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Audio => "Audio",
            Self::Images => "Images",
            Self::Models => "Models",
            Self::Materials => "Materials",
            Self::Shaders => "Shaders",
            Self::Scripts => "Scripts",
            Self::Video => "Video",
            Self::Fonts => "Fonts",
            Self::Documents => "Documents",
            Self::Archives => "Archives",
        }
    }

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Audio => AUDIO_EXTENSIONS,
            Self::Images => IMAGE_EXTENSIONS,
            Self::Models => MODEL_EXTENSIONS,
            Self::Materials => MATERIAL_EXTENSIONS,
            Self::Shaders => SHADER_EXTENSIONS,
            Self::Scripts => SCRIPT_EXTENSIONS,
            Self::Video => VIDEO_EXTENSIONS,
            Self::Fonts => FONT_EXTENSIONS,
            Self::Documents => DOCUMENT_EXTENSIONS,
            Self::Archives => ARCHIVE_EXTENSIONS,
        }
    }

    /// Whether a (lowercase, dot-less) extension belongs to this category.
    pub fn matches_extension(self, extension: &str) -> bool {
        let extension = extension.trim_start_matches('.');
        self.extensions()
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(extension))
    }
}

// ---------------------------------------------------------------------------
// Type category lookup
// ---------------------------------------------------------------------------

/// Looks up a type category by name or alias.
pub fn lookup_type_category(value: &str) -> Option<TypeCategory> {
    match value.trim().to_ascii_lowercase().as_str() {
        "audio" | "sound" | "sounds" | "music" => Some(TypeCategory::Audio),
        "image" | "images" | "texture" | "textures" | "picture" | "pictures" => {
            Some(TypeCategory::Images)
        }
        "model" | "models" | "mesh" | "meshes" | "3d" => Some(TypeCategory::Models),
        "material" | "materials" => Some(TypeCategory::Materials),
        "shader" | "shaders" => Some(TypeCategory::Shaders),
        "script" | "scripts" | "code" => Some(TypeCategory::Scripts),
        "video" | "videos" | "movie" | "movies" => Some(TypeCategory::Video),
        "font" | "fonts" => Some(TypeCategory::Fonts),
        "doc" | "docs" | "document" | "documents" | "text" => Some(TypeCategory::Documents),
        "archive" | "archives" | "zip" | "compressed" => Some(TypeCategory::Archives),
        _ => None,
    }
}
