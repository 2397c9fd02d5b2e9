use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

fn main() {
    let src = Path::new("ui").join("index.html");
    println!("cargo:rerun-if-changed={}", src.display());

    let mut html = Vec::with_capacity(32 * 1024);
    File::open(&src)
        .and_then(|mut f| f.read_to_end(&mut html))
        .expect("Read ui/index.html failed");

    let mut encoder = GzEncoder::new(Vec::with_capacity(html.len()), Compression::best());
    encoder.write_all(&html).expect("Compress page failed");
    let gz = encoder.finish().expect("Compress page failed");

    let out_dir = std::env::var("OUT_DIR").expect("OUT_DIR is not set");
    let dest = Path::new(&out_dir).join("index.html.gz");
    std::fs::write(dest, gz).expect("Write compressed page failed");
}
