fn main() {
    // Vendored protoc, so builds do not depend on a system installation.
    let protoc = protoc_bin_vendored::protoc_bin_path().expect("vendored protoc not found");
    std::env::set_var("PROTOC", protoc);

    println!("cargo:rerun-if-changed=proto/zonemesh.proto");
    tonic_build::compile_protos("proto/zonemesh.proto").expect("failed to compile proto/zonemesh.proto");
}
