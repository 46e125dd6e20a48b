use super::*;

impl PostgresSecurityAdminRepository {
    pub(super) async fn assign_role_impl(
        &self,
        principal_id: PrincipalId,
        role_id: RoleId,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, role_id) DO NOTHING
            "#,
        )
        .bind(principal_id.as_i64())
        .bind(role_id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|error| match foreign_key_constraint(&error) {
            Some("user_roles_user_id_fkey") => {
                AppError::NotFound(format!("user '{principal_id}' was not found"))
            }
            Some(_) => AppError::NotFound(format!("role '{role_id}' was not found")),
            None => AppError::Internal(format!("failed to assign role: {error}")),
        })?;

        Ok(())
    }

    pub(super) async fn unassign_role_impl(
        &self,
        principal_id: PrincipalId,
        role_id: RoleId,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM user_roles
            WHERE user_id = $1
                AND role_id = $2
            "#,
        )
        .bind(principal_id.as_i64())
        .bind(role_id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to remove role assignment: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "role '{role_id}' is not assigned to user '{principal_id}'"
            )));
        }

        Ok(())
    }

    pub(super) async fn list_role_assignments_impl(
        &self,
        principal_id: Option<PrincipalId>,
    ) -> AppResult<Vec<RoleAssignment>> {
        let rows = sqlx::query_as::<_, RoleAssignmentRow>(
            r#"
            SELECT
                user_roles.user_id,
                user_roles.role_id,
                roles.name AS role_name,
                user_roles.assigned_at
            FROM user_roles
            INNER JOIN roles
                ON roles.id = user_roles.role_id
            WHERE $1::BIGINT IS NULL OR user_roles.user_id = $1
            ORDER BY user_roles.user_id, roles.name
            "#,
        )
        .bind(principal_id.map(|principal_id| principal_id.as_i64()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role assignments: {error}")))?;

        Ok(rows
            .into_iter()
            .map(|row| RoleAssignment {
                principal_id: PrincipalId::new(row.user_id),
                role_id: RoleId::new(row.role_id),
                role_name: row.role_name,
                assigned_at: row.assigned_at,
            })
            .collect())
    }
}
