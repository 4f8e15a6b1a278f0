use crate::entry::ManifestEntry;
use crate::path::RelPath;
use crate::types::{Architecture, FileType, TlsClass};
use tracing::trace;

/// Suffix very old branches appended to 32-bit types, e.g. `OPENGL_LIB_32`.
const COMPAT32_TYPE_SUFFIX: &str = "_32";
/// Suffix of types that encode the TLS class inline, e.g. `OPENGL_SYMLINK_NEW_TLS`.
const TLS_TYPE_SUFFIX: &str = "_TLS";
const OPENGL_HEADER: &str = "OPENGL_HEADER";
const OPENGL_HEADER_DIR: &str = "GL";

/// Hierarchy prefixes old manifests embedded in install directories.
///
/// Checked in order; the first match wins.
const LEGACY_PREFIXES: &[(&str, Option<Architecture>)] = &[
    ("usr/bin", None),
    ("share/doc/NVIDIA_GLX-1.0", None),
    ("lib64", Some(Architecture::Native)),
    ("lib", Some(Architecture::Compat32)),
    ("NVIDIA_GLX-1.0", None),
];

impl ManifestEntry {
    /// Apply release-specific fixups in place.
    ///
    /// Steps run in a fixed order since later ones read fields earlier ones
    /// rewrote.
    pub fn normalize(&mut self, kernel_build_dir: &RelPath) {
        self.inherit_kernel_source_dir(kernel_build_dir);
        let decoded = self.decode_legacy_type();
        self.default_header_dir(&decoded);
        self.strip_legacy_prefix();
    }

    /// Kernel sources predating `INHERIT_PATH_DEPTH` keep their layout below the
    /// build directory.
    fn inherit_kernel_source_dir(&mut self, kernel_build_dir: &RelPath) {
        if !self.path.is_current() {
            return;
        }
        if let Some(rest) = self.file_path.strip_prefix(kernel_build_dir) {
            self.path = rest.parent();
        }
    }

    /// Strip the `_32` marker and split inline TLS classes off the type.
    ///
    /// Returns the decoded type.
    fn decode_legacy_type(&mut self) -> FileType {
        if let Some(stripped) = self.file_type.strip_suffix(COMPAT32_TYPE_SUFFIX) {
            self.file_type = FileType::new(stripped);
        }

        if self.file_type.ends_with(TLS_TYPE_SUFFIX) {
            let mut segments: Vec<&str> = self.file_type.split('_').collect();
            let class = segments
                .len()
                .checked_sub(2)
                .filter(|&i| i > 0)
                .and_then(|i| TlsClass::from_token(segments[i]));
            if let Some(class) = class {
                segments[0] = "TLS";
                segments.truncate(segments.len() - 2);
                let decoded = FileType::new(segments.join("_"));
                trace!("decoded legacy type {} as {decoded}", self.file_type);
                self.tls_class = Some(class);
                self.file_type = decoded;
            }
        }

        self.file_type.clone()
    }

    fn default_header_dir(&mut self, decoded: &FileType) {
        if decoded == OPENGL_HEADER && self.path.is_current() {
            self.path = RelPath::new(OPENGL_HEADER_DIR);
        }
    }

    fn strip_legacy_prefix(&mut self) {
        for (prefix, arch) in LEGACY_PREFIXES {
            if let Some(rest) = self.path.strip_prefix(&RelPath::new(prefix)) {
                self.path = rest;
                if self.architecture.is_none() {
                    self.architecture = *arch;
                }
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(line: &str, build_dir: &str) -> ManifestEntry {
        let mut entry = ManifestEntry::parse(line).unwrap();
        entry.normalize(&RelPath::new(build_dir));
        entry
    }

    #[test]
    fn kernel_sources_keep_build_dir_layout() {
        let e = normalized("usr/src/nv/os-interface.c 0644 KERNEL_MODULE_SRC", "usr/src/nv");
        assert!(e.path.is_current());

        let e = normalized("usr/src/nv/conftest/x.h 0644 KERNEL_MODULE_SRC", "usr/src/nv");
        assert_eq!(e.path.to_string(), "conftest");
    }

    #[test]
    fn explicit_dir_is_not_replaced_by_build_dir() {
        let e = normalized("kernel/nvidia/nv.c 0644 KERNEL_MODULE_SRC src", "kernel");
        assert_eq!(e.path.to_string(), "src");
    }

    #[test]
    fn decodes_inline_tls_type() {
        let e = normalized(
            "libGL.so 0000 OPENGL_SYMLINK_NEW_TLS_32 libGL.so.1",
            "usr/src/nv",
        );
        assert_eq!(e.file_type, "TLS_SYMLINK");
        assert_eq!(e.tls_class, Some(TlsClass::New));
        assert_eq!(e.extra(), Some("NEW"));
    }

    #[test]
    fn strips_compat32_type_marker() {
        let e = normalized("libGLcore.so.1 0755 OPENGL_LIB_32 /lib", "usr/src/nv");
        assert_eq!(e.file_type, "OPENGL_LIB");
        assert!(e.tls_class.is_none());
    }

    #[test]
    fn short_tls_type_is_left_alone() {
        let e = normalized("libnvidia-tls.so 0644 NEW_TLS", "kernel");
        assert_eq!(e.file_type, "NEW_TLS");
        assert!(e.tls_class.is_none());
    }

    #[test]
    fn opengl_header_defaults_to_gl_dir() {
        let e = normalized("usr/include/GL/gl.h 0644 OPENGL_HEADER", "usr/src/nv");
        assert_eq!(e.path.to_string(), "GL");

        let e = normalized("gl.h 0644 OPENGL_HEADER include/GL", "usr/src/nv");
        assert_eq!(e.path.to_string(), "include/GL");
    }

    #[test]
    fn strips_library_root_and_infers_arch() {
        let e = normalized("libcuda.so.1 0755 CUDA_LIB /lib64", "kernel");
        assert!(e.path.is_current());
        assert_eq!(e.architecture, Some(Architecture::Native));

        let e = normalized("libcuda.so.1 0755 CUDA_LIB lib/tls", "kernel");
        assert_eq!(e.path.to_string(), "tls");
        assert_eq!(e.architecture, Some(Architecture::Compat32));
    }

    #[test]
    fn explicit_arch_wins_over_inferred() {
        let e = normalized("libcuda.so.1 0755 CUDA_LIB NATIVE /lib", "kernel");
        assert_eq!(e.architecture, Some(Architecture::Native));
        assert!(e.path.is_current());
    }

    #[test]
    fn strips_doc_roots_without_arch() {
        let e = normalized("README 0644 DOCUMENTATION share/doc/NVIDIA_GLX-1.0/html", "kernel");
        assert_eq!(e.path.to_string(), "html");
        assert!(e.architecture.is_none());

        let e = normalized("nvidia-modprobe 4755 UTILITY_BINARY /usr/bin", "kernel");
        assert!(e.path.is_current());
    }

    #[test]
    fn prefix_match_is_segment_wise() {
        let e = normalized("libfoo.so 0644 LIB library/x", "kernel");
        assert_eq!(e.path.to_string(), "library/x");
        assert!(e.architecture.is_none());
    }
}
