use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Configs {
    pub servidor: ServidorConfig,
    pub almacenamiento: AlmacenamientoConfig,
    pub sesion: SesionConfig,

    #[serde(skip)]
    config_path: PathBuf,
}

impl Configs {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let config_content = fs::read_to_string(&path)?;
        let mut configs: Configs = toml::from_str(&config_content)?;
        configs.config_path = path.as_ref().to_path_buf();
        Ok(configs)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServidorConfig {
    pub host: String,
    pub puerto: u16,
    pub origen_frontend: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AlmacenamientoConfig {
    pub directorio: String,
    pub url_base: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SesionConfig {
    pub secreto: String,
    pub duracion_dias: i64,
    /// Marca la cookie como `Secure`; encendido en despliegues con HTTPS.
    #[serde(default)]
    pub cookie_segura: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn carga_config_completa() {
        let mut archivo = tempfile::NamedTempFile::new().unwrap();
        write!(
            archivo,
            r#"
[servidor]
host = "127.0.0.1"
puerto = 4000
origen_frontend = "http://localhost:3000"

[almacenamiento]
directorio = "/tmp/uploads"
url_base = "http://localhost:4000/uploads"

[sesion]
secreto = "abc"
duracion_dias = 7
cookie_segura = true
"#
        )
        .unwrap();

        let cfg = Configs::load_from_file(archivo.path()).unwrap();
        assert_eq!(cfg.servidor.puerto, 4000);
        assert_eq!(cfg.sesion.duracion_dias, 7);
        assert!(cfg.sesion.cookie_segura);
        assert_eq!(cfg.almacenamiento.directorio, "/tmp/uploads");
    }

    #[test]
    fn cookie_segura_apagada_por_defecto() {
        let mut archivo = tempfile::NamedTempFile::new().unwrap();
        write!(
            archivo,
            r#"
[servidor]
host = "127.0.0.1"
puerto = 4000
origen_frontend = "http://localhost:3000"

[almacenamiento]
directorio = "/tmp/uploads"
url_base = "http://localhost:4000/uploads"

[sesion]
secreto = "abc"
duracion_dias = 7
"#
        )
        .unwrap();

        let cfg = Configs::load_from_file(archivo.path()).unwrap();
        assert!(!cfg.sesion.cookie_segura);
    }
}
