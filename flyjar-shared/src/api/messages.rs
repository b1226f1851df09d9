//! User-facing message strings. Clients show these verbatim.

pub const ROOT_OK: &str = "Backend funcionando correctamente!";
pub const MISSING_FIELDS: &str = "Faltan datos obligatorios";

pub const USER_REGISTERED: &str = "Usuario registrado";
pub const USER_EXISTS: &str = "El usuario ya existe";
pub const REGISTER_FAILED: &str = "No se pudo registrar el usuario";

pub const LOGIN_OK: &str = "Inicio de sesión exitoso";
pub const USER_NOT_FOUND: &str = "Usuario no encontrado";
pub const WRONG_PASSWORD: &str = "Contraseña incorrecta";
pub const LOGIN_FAILED: &str = "No se pudo iniciar sesión";

pub const SESSION_ACTIVE: &str = "Sesión activa";
pub const INVALID_SESSION: &str = "Sesión no válida";

pub const POKEMON_ASSIGNED: &str = "Pokemon asignado";
pub const POKEMON_FAILED: &str = "Error al asignar el pokemon";

pub const JAR_CREATED: &str = "Frasco creado";
pub const JAR_CREATE_FAILED: &str = "Error al crear el bote";
pub const JAR_LIST_FAILED: &str = "Error al listar los Frascos";
pub const JAR_GET_FAILED: &str = "Error al listar el bote";
pub const JAR_UPDATED: &str = "Bote modificado";
pub const JAR_UPDATE_FAILED: &str = "Error al modificar el bote";
pub const JAR_DELETED: &str = "Bote borrado";
pub const JAR_DELETE_FAILED: &str = "Error al borrar el bote";

pub const FLY_CREATED: &str = "Mosca creada";
pub const FLY_CREATE_FAILED: &str = "Error al crear la mosca";
pub const FLY_LIST_FAILED: &str = "Error al listar las moscas";
pub const FLY_DELETED: &str = "Mosca borrada";
pub const FLY_DELETE_FAILED: &str = "Error al borrar la mosca";
