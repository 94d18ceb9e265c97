// Service code is generated from the hand-written prost messages in
// `src/proto.rs`; no `.proto` file or `protoc` is involved.

use tonic_build::manual::{Builder, Method, Service};

fn method(name: &str, route: &str, input: &str, output: &str) -> tonic_build::manual::MethodBuilder {
    Method::builder()
        .name(name)
        .route_name(route)
        .input_type(format!("crate::proto::{input}"))
        .output_type(format!("crate::proto::{output}"))
        .codec_path("tonic::codec::ProstCodec")
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let laptop_service = Service::builder()
        .name("LaptopService")
        .package("techschool.pcbook")
        .method(
            method("create_laptop", "CreateLaptop", "CreateLaptopRequest", "CreateLaptopResponse")
                .build(),
        )
        .method(
            method("search_laptop", "SearchLaptop", "SearchLaptopRequest", "SearchLaptopResponse")
                .server_streaming()
                .build(),
        )
        .method(
            method("upload_image", "UploadImage", "UploadImageRequest", "UploadImageResponse")
                .client_streaming()
                .build(),
        )
        .method(
            method("rate_laptop", "RateLaptop", "RateLaptopRequest", "RateLaptopResponse")
                .client_streaming()
                .server_streaming()
                .build(),
        )
        .build();

    let auth_service = Service::builder()
        .name("AuthService")
        .package("techschool.pcbook")
        .method(method("login", "Login", "LoginRequest", "LoginResponse").build())
        .build();

    Builder::new().compile(&[laptop_service, auth_service]);
}
