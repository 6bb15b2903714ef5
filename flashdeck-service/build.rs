fn main() {
    // PDFium is bound at runtime, so there is nothing to link here.
    // The service looks for libpdfium in ./, then ./vendor/pdfium/lib/,
    // then the system library paths.
    println!("cargo:rerun-if-changed=build.rs");
}
