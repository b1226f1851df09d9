use crate::storage::schema::{flies, jars, users};
use diesel::prelude::*;
use flyjar_shared::api::{FlyDto, JarDto};

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i32,
    pub username: String,
    /// bcrypt hash
    pub password: String,
    pub token: Option<String>,
    pub pokemon: Option<String>,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = jars)]
pub struct Jar {
    pub id: i32,
    pub user_id: Option<i32>,
    pub name: Option<String>,
}

#[derive(Insertable)]
#[diesel(table_name = jars)]
pub struct NewJar<'a> {
    pub user_id: i32,
    pub name: &'a str,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = flies)]
pub struct Fly {
    pub id: i32,
    pub jar_id: Option<i32>,
    pub body_color: Option<String>,
}

#[derive(Insertable)]
#[diesel(table_name = flies)]
pub struct NewFly<'a> {
    pub jar_id: i32,
    pub body_color: &'a str,
}

impl From<Jar> for JarDto {
    fn from(j: Jar) -> Self {
        JarDto {
            id: j.id,
            user_id: j.user_id,
            name: j.name,
        }
    }
}

impl From<Fly> for FlyDto {
    fn from(f: Fly) -> Self {
        FlyDto {
            id: f.id,
            jar_id: f.jar_id,
            body_color: f.body_color,
        }
    }
}
