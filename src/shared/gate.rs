//! Page-routing gate: given a path and the caller's role, decide whether the
//! page renders or where the browser is sent instead. The frontend
//! middleware drives this table after asking `/api/auth/sesion`.

use crate::shared::workflow::Rol;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destino {
    Renderizar,
    Redirigir(&'static str),
}

pub fn resolver(path: &str, rol: Option<Rol>) -> Destino {
    let es_staff = matches!(rol, Some(Rol::Admin) | Some(Rol::Supervisor) | Some(Rol::Tecnico));
    let es_solicitante = rol == Some(Rol::Solicitante);

    if path == "/" {
        return Destino::Redirigir("/login");
    }

    if path == "/login" {
        if es_staff {
            return Destino::Redirigir("/admin");
        }
        if es_solicitante {
            return Destino::Redirigir("/dashboard");
        }
        return Destino::Renderizar;
    }

    if path == "/admin" || path.starts_with("/admin/") {
        if es_staff {
            return Destino::Renderizar;
        }
        if es_solicitante {
            return Destino::Redirigir("/dashboard");
        }
        return Destino::Redirigir("/login");
    }

    if path == "/dashboard" || path.starts_with("/dashboard/") {
        if es_solicitante {
            return Destino::Renderizar;
        }
        if es_staff {
            return Destino::Redirigir("/admin");
        }
        return Destino::Redirigir("/login");
    }

    Destino::Renderizar
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAFF: [Rol; 3] = [Rol::Admin, Rol::Supervisor, Rol::Tecnico];

    #[test]
    fn raiz_siempre_al_login() {
        assert_eq!(resolver("/", None), Destino::Redirigir("/login"));
        assert_eq!(resolver("/", Some(Rol::Admin)), Destino::Redirigir("/login"));
        assert_eq!(
            resolver("/", Some(Rol::Solicitante)),
            Destino::Redirigir("/login")
        );
    }

    #[test]
    fn login_segun_rol() {
        assert_eq!(resolver("/login", None), Destino::Renderizar);
        assert_eq!(
            resolver("/login", Some(Rol::Solicitante)),
            Destino::Redirigir("/dashboard")
        );
        for rol in STAFF {
            assert_eq!(resolver("/login", Some(rol)), Destino::Redirigir("/admin"));
        }
    }

    #[test]
    fn admin_solo_para_staff() {
        assert_eq!(resolver("/admin", None), Destino::Redirigir("/login"));
        assert_eq!(
            resolver("/admin/solicitudes", Some(Rol::Solicitante)),
            Destino::Redirigir("/dashboard")
        );
        for rol in STAFF {
            assert_eq!(resolver("/admin/usuarios", Some(rol)), Destino::Renderizar);
        }
    }

    #[test]
    fn dashboard_solo_para_solicitantes() {
        assert_eq!(resolver("/dashboard", None), Destino::Redirigir("/login"));
        assert_eq!(
            resolver("/dashboard/perfil", Some(Rol::Solicitante)),
            Destino::Renderizar
        );
        for rol in STAFF {
            assert_eq!(
                resolver("/dashboard", Some(rol)),
                Destino::Redirigir("/admin")
            );
        }
    }
}
