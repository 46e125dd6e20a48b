use super::*;

impl PostgresSecurityAdminRepository {
    pub(super) async fn list_roles_impl(&self) -> AppResult<Vec<RoleDefinition>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                roles.id AS role_id,
                roles.name AS role_name,
                roles.description,
                permissions.key AS permission
            FROM roles
            LEFT JOIN role_permissions
                ON role_permissions.role_id = roles.id
            LEFT JOIN permissions
                ON permissions.id = role_permissions.permission_id
            ORDER BY roles.name, permissions.key
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        aggregate_roles(rows)
    }

    pub(super) async fn find_role_impl(&self, role_id: RoleId) -> AppResult<Option<RoleDefinition>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                roles.id AS role_id,
                roles.name AS role_name,
                roles.description,
                permissions.key AS permission
            FROM roles
            LEFT JOIN role_permissions
                ON role_permissions.role_id = roles.id
            LEFT JOIN permissions
                ON permissions.id = role_permissions.permission_id
            WHERE roles.id = $1
            ORDER BY permissions.key
            "#,
        )
        .bind(role_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role: {error}")))?;

        Ok(aggregate_roles(rows)?.into_iter().next())
    }

    pub(super) async fn create_role_impl(
        &self,
        input: CreateRoleInput,
    ) -> AppResult<RoleDefinition> {
        let mut transaction = begin(&self.pool).await?;
        let permission_ids = resolve_permission_ids(&mut transaction, &input.permissions).await?;

        let role_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO roles (name, description)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(input.name.as_str())
        .bind(input.description.as_deref())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                return AppError::Conflict(format!("role '{}' already exists", input.name.as_str()));
            }
            AppError::Internal(format!("failed to create role: {error}"))
        })?;

        insert_role_grants(&mut transaction, role_id, &permission_ids).await?;
        commit(transaction).await?;

        Ok(RoleDefinition {
            id: RoleId::new(role_id),
            name: input.name.into(),
            description: input.description,
            permissions: input.permissions.into_iter().collect(),
        })
    }

    pub(super) async fn replace_role_permissions_impl(
        &self,
        role_id: RoleId,
        permissions: BTreeSet<PermissionKey>,
    ) -> AppResult<RoleDefinition> {
        let mut transaction = begin(&self.pool).await?;

        // Row lock serializes concurrent replacements of the same role.
        let role = sqlx::query_as::<_, (String, Option<String>)>(
            r#"
            SELECT name, description
            FROM roles
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(role_id.as_i64())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock role: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;

        let permission_ids = resolve_permission_ids(&mut transaction, &permissions).await?;

        sqlx::query(
            r#"
            DELETE FROM role_permissions
            WHERE role_id = $1
            "#,
        )
        .bind(role_id.as_i64())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to clear role grants: {error}")))?;

        insert_role_grants(&mut transaction, role_id.as_i64(), &permission_ids).await?;
        commit(transaction).await?;

        let (name, description) = role;
        Ok(RoleDefinition {
            id: role_id,
            name,
            description,
            permissions: permissions.into_iter().collect(),
        })
    }

    pub(super) async fn delete_role_impl(&self, role_id: RoleId) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;

        let exists = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id
            FROM roles
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(role_id.as_i64())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock role: {error}")))?;

        if exists.is_none() {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        let assignments = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM user_roles
            WHERE role_id = $1
            "#,
        )
        .bind(role_id.as_i64())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count role assignments: {error}")))?;

        if assignments > 0 {
            return Err(role_still_assigned(role_id, u64::try_from(assignments).unwrap_or(0)));
        }

        sqlx::query(
            r#"
            DELETE FROM roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_i64())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            if foreign_key_constraint(&error).is_some() {
                return role_still_assigned(role_id, 1);
            }
            AppError::Internal(format!("failed to delete role: {error}"))
        })?;

        commit(transaction).await
    }
}

fn role_still_assigned(role_id: RoleId, assignments: u64) -> AppError {
    AppError::DependentsExist {
        message: format!("role '{role_id}' is still assigned"),
        dependents: BTreeMap::from([("role_assignments".to_owned(), assignments)]),
    }
}
