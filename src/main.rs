#[rocket::launch]
fn rocket() -> _ {
    archive_server::rocket()
}
