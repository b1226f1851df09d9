fn base_join(base: &str, path: &str) -> String {
    let b = base.trim_end_matches('/');
    let p = path.trim_start_matches('/');
    format!("{}/{}", b, p)
}

pub fn root(base: &str) -> String {
    base_join(base, "/")
}
pub fn register(base: &str) -> String {
    base_join(base, "/register")
}
pub fn login(base: &str) -> String {
    base_join(base, "/login")
}
pub fn profile(base: &str) -> String {
    base_join(base, "/profile")
}
pub fn jars(base: &str) -> String {
    base_join(base, "/jars")
}
pub fn jar(base: &str, id: i32) -> String {
    base_join(base, &format!("/jars/{}", id))
}
pub fn flies(base: &str) -> String {
    base_join(base, "/flies")
}
pub fn jar_flies(base: &str, jar_id: i32) -> String {
    base_join(base, &format!("/flies/{}", jar_id))
}
pub fn fly(base: &str, jar_id: i32, id: i32) -> String {
    base_join(base, &format!("/flies/{}/{}", jar_id, id))
}
