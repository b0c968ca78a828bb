diesel::table! {
    usuarios (id) {
        id -> Uuid,
        #[max_length = 60]
        username -> Varchar,
        #[max_length = 120]
        nombre_completo -> Nullable<Varchar>,
        #[max_length = 20]
        rol -> Varchar,
        password_hash -> Varchar,
        avatar_url -> Nullable<Varchar>,
        activo -> Bool,
        created_at -> Timestamp,
    }
}

diesel::table! {
    sectores (id) {
        id -> Uuid,
        #[max_length = 120]
        nombre -> Varchar,
        activo -> Bool,
        created_at -> Timestamp,
    }
}

diesel::table! {
    equipos_maquinas (id) {
        id -> Uuid,
        #[max_length = 120]
        nombre -> Varchar,
        sector_id -> Nullable<Uuid>,
        activo -> Bool,
        created_at -> Timestamp,
    }
}

diesel::table! {
    solicitudes (id) {
        id -> Uuid,
        usuario_id -> Uuid,
        #[max_length = 120]
        nombre_solicitante -> Varchar,
        #[max_length = 60]
        tipo_solicitud -> Varchar,
        #[max_length = 20]
        criticidad -> Varchar,
        descripcion -> Text,
        imagen_url -> Nullable<Varchar>,
        sector_id -> Nullable<Uuid>,
        equipo_id -> Nullable<Uuid>,
        #[max_length = 20]
        estado -> Varchar,
        created_at -> Timestamp,
        fecha_recepcion_supervisor -> Nullable<Timestamp>,
        fecha_vista_supervisor -> Nullable<Timestamp>,
        fecha_derivacion_tecnico -> Nullable<Timestamp>,
        derivado_por_id -> Nullable<Uuid>,
        tecnico_asignado_id -> Nullable<Uuid>,
        fecha_vista_tecnico -> Nullable<Timestamp>,
        fecha_inicio_trabajo -> Nullable<Timestamp>,
        fecha_estimada -> Nullable<Date>,
        fecha_finalizacion -> Nullable<Timestamp>,
    }
}

diesel::table! {
    observaciones (id) {
        id -> Uuid,
        solicitud_id -> Uuid,
        autor_id -> Uuid,
        #[max_length = 120]
        autor_nombre -> Varchar,
        #[max_length = 20]
        autor_rol -> Varchar,
        texto -> Text,
        imagen_url -> Nullable<Varchar>,
        created_at -> Timestamp,
    }
}

diesel::joinable!(equipos_maquinas -> sectores (sector_id));
diesel::joinable!(observaciones -> solicitudes (solicitud_id));

diesel::allow_tables_to_appear_in_same_query!(
    usuarios,
    sectores,
    equipos_maquinas,
    solicitudes,
    observaciones,
);
